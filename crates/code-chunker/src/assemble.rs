use crate::cancel::CancellationToken;
use crate::classify::Classified;
use crate::error::{Result, StructuralError};
use crate::types::Chunk;
use std::collections::{HashMap, HashSet};

/// Turns classified nodes into the final, parent-linked chunk list
pub struct ChunkAssembler {
    include_content: bool,
}

impl ChunkAssembler {
    pub fn new(include_content: bool) -> Self {
        Self { include_content }
    }

    pub fn assemble(
        &self,
        classified: Vec<Classified<'_>>,
        source: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Chunk>> {
        let mut seen = HashSet::with_capacity(classified.len());
        for item in &classified {
            if !seen.insert(item.node.id()) {
                return Err(StructuralError::DuplicateNode {
                    name: item.qualified_name.clone(),
                    start: item.node.span().start_byte,
                }
                .into());
            }
        }

        let survivors = drop_shadowed(classified);

        let mut index_of: HashMap<usize, usize> = HashMap::with_capacity(survivors.len());
        let mut chunks = Vec::with_capacity(survivors.len());

        for item in survivors {
            cancel.check()?;

            let parent = item
                .node
                .ancestors()
                .find_map(|ancestor| index_of.get(&ancestor.id()).copied());
            let span = item.node.span();
            let content = if self.include_content {
                source.get(span.byte_range()).map(str::to_string)
            } else {
                None
            };

            index_of.insert(item.node.id(), chunks.len());
            chunks.push(Chunk {
                qualified_name: item.qualified_name,
                name: item.name,
                role: item.role,
                span,
                parent,
                decorated: item.decorated,
                content,
            });
        }

        verify_tree(&chunks)?;
        Ok(chunks)
    }
}

/// Last declaration of a qualified name wins; earlier ones are dropped together
/// with everything nested inside them.
fn drop_shadowed(classified: Vec<Classified<'_>>) -> Vec<Classified<'_>> {
    let mut last: HashMap<&str, usize> = HashMap::new();
    for (index, item) in classified.iter().enumerate() {
        last.insert(item.qualified_name.as_str(), index);
    }

    let shadowed: HashSet<usize> = classified
        .iter()
        .enumerate()
        .filter(|(index, item)| last.get(item.qualified_name.as_str()) != Some(index))
        .map(|(_, item)| item.node.id())
        .collect();

    if shadowed.is_empty() {
        return classified;
    }

    let mut dropped: HashSet<usize> = HashSet::new();
    classified
        .into_iter()
        .filter(|item| {
            let id = item.node.id();
            let inside_dropped = item
                .node
                .ancestors()
                .any(|ancestor| dropped.contains(&ancestor.id()));
            if shadowed.contains(&id) || inside_dropped {
                log::debug!(
                    "dropping shadowed declaration `{}` at line {}",
                    item.qualified_name,
                    item.node.span().start_line
                );
                dropped.insert(id);
                false
            } else {
                true
            }
        })
        .collect()
}

/// Check span containment against parents and overlap between siblings.
/// Expects chunks in source order with parents before children.
pub fn verify_tree(chunks: &[Chunk]) -> std::result::Result<(), StructuralError> {
    let mut last_sibling: HashMap<Option<usize>, usize> = HashMap::new();

    for (index, chunk) in chunks.iter().enumerate() {
        if let Some(parent_index) = chunk.parent {
            let parent = chunks
                .get(parent_index)
                .filter(|_| parent_index < index)
                .ok_or_else(|| StructuralError::SpanEscape {
                    child: chunk.qualified_name.clone(),
                    parent: format!("#{parent_index}"),
                })?;

            if !parent.span.strictly_contains(&chunk.span) {
                return Err(StructuralError::SpanEscape {
                    child: chunk.qualified_name.clone(),
                    parent: parent.qualified_name.clone(),
                });
            }
        }

        if let Some(previous) = last_sibling.insert(chunk.parent, index) {
            let previous = &chunks[previous];
            if previous.span.overlaps(&chunk.span) {
                return Err(StructuralError::SiblingOverlap {
                    first: previous.qualified_name.clone(),
                    second: chunk.qualified_name.clone(),
                });
            }
        }
    }

    Ok(())
}

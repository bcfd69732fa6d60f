use crate::cancel::CancellationToken;
use crate::error::{ChunkerError, Result};
use crate::query::Candidate;
use std::collections::HashMap;

/// Candidate with its dot-joined qualified name
#[derive(Debug, Clone)]
pub struct QualifiedCandidate<'t> {
    pub candidate: Candidate<'t>,
    pub qualified_name: String,
}

/// Builds qualified names from the named scopes found by the capture engine.
///
/// Only nodes that were themselves captured count as named scopes; blocks,
/// conditionals and anonymous functions in between are skipped.
pub struct NameQualifier {
    scopes: HashMap<usize, String>,
    max_depth: usize,
}

impl NameQualifier {
    pub fn new(candidates: &[Candidate<'_>], max_depth: usize) -> Self {
        let scopes = candidates
            .iter()
            .map(|candidate| (candidate.node.id(), candidate.name.clone()))
            .collect();
        Self { scopes, max_depth }
    }

    pub fn qualify(&self, candidate: &Candidate<'_>) -> Result<String> {
        let mut segments = vec![candidate.name.as_str()];

        for (depth, ancestor) in candidate.node.ancestors().enumerate() {
            if depth >= self.max_depth {
                return Err(ChunkerError::NestingTooDeep {
                    depth: depth + 1,
                    limit: self.max_depth,
                });
            }
            if let Some(name) = self.scopes.get(&ancestor.id()) {
                segments.push(name);
            }
        }

        segments.reverse();
        Ok(segments.join("."))
    }

    pub fn qualify_all<'t>(
        &self,
        candidates: Vec<Candidate<'t>>,
        cancel: &CancellationToken,
    ) -> Result<Vec<QualifiedCandidate<'t>>> {
        candidates
            .into_iter()
            .map(|candidate| {
                cancel.check()?;
                let qualified_name = self.qualify(&candidate)?;
                Ok(QualifiedCandidate {
                    candidate,
                    qualified_name,
                })
            })
            .collect()
    }
}

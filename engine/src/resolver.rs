use crate::error::EngineError;

/// Answer to "is this face `candidate`?".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchDecision {
    /// The proposed candidate is correct.
    Accept,
    /// The candidate is wrong; the contained name is the correct identity.
    Reject(String),
    /// Leave this face undecided. Nothing is recorded for it.
    Skip,
}

/// Answer to "who is this unknown face?".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameDecision {
    /// Register under this name. An empty name yields a synthesized
    /// timestamp placeholder.
    Name(String),
    /// Drop the face without registering anything.
    Skip,
}

/// Synchronous disambiguation callback invoked when the engine cannot
/// decide on its own. May block indefinitely (e.g. a terminal prompt);
/// callers needing responsiveness run ingestion off any latency-sensitive
/// path.
///
/// Non-interactive deployments inject a policy implementation such as
/// [`AutoSkipResolver`] instead of a prompt.
pub trait Resolver: Send + Sync {
    /// Asks whether the face at hand is `candidate`, matched with the
    /// given similarity.
    fn confirm_match(&self, candidate: &str, similarity: f32)
    -> Result<MatchDecision, EngineError>;

    /// Asks for the name of a face no known identity matched.
    fn name_new_face(&self) -> Result<NameDecision, EngineError>;
}

/// Resolver for non-interactive deployments: never confirms a match and
/// never names a new face, so uncertain faces are dropped and only
/// auto-confirmed matches mutate the registry.
pub struct AutoSkipResolver;

impl Resolver for AutoSkipResolver {
    fn confirm_match(
        &self,
        _candidate: &str,
        _similarity: f32,
    ) -> Result<MatchDecision, EngineError> {
        Ok(MatchDecision::Skip)
    }

    fn name_new_face(&self) -> Result<NameDecision, EngineError> {
        Ok(NameDecision::Skip)
    }
}

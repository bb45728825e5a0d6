use std::fmt;

/// Failures the engine reports to its caller.
///
/// Out-of-range screens, layers and indices are not errors: every entry point
/// clamps them. Operations on inactive slots are no-ops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A buffer or video memory allocation could not be satisfied.
    /// The slot that requested it is left as it was before the call.
    ResourceExhausted {
        what: &'static str,
        requested: usize,
        available: usize,
    },
}

impl EngineError {
    pub(crate) const fn exhausted(what: &'static str, requested: usize, available: usize) -> Self {
        Self::ResourceExhausted {
            what,
            requested,
            available,
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceExhausted {
                what,
                requested,
                available,
            } => write!(
                f,
                "{what}: requested {requested} bytes but only {available} available"
            ),
        }
    }
}

impl std::error::Error for EngineError {}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Copies `data` into a freshly reserved buffer, reporting allocation failure
/// instead of aborting.
pub(crate) fn try_copy<T: Copy>(what: &'static str, data: &[T]) -> Result<Vec<T>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(data.len())
        .map_err(|_| EngineError::exhausted(what, std::mem::size_of_val(data), 0))?;
    buffer.extend_from_slice(data);
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_names_the_resource() {
        let err = EngineError::exhausted("sprite vram", 4096, 1024);
        assert_eq!(
            err.to_string(),
            "sprite vram: requested 4096 bytes but only 1024 available"
        );
    }

    #[test]
    fn try_copy_duplicates_data() {
        let copy = try_copy("tiles", &[1_u8, 2, 3]).unwrap();
        assert_eq!(copy, vec![1, 2, 3]);
    }
}

use thiserror::Error;

/// Failures surfaced by ingestion and help search.
///
/// `GeocodeUnavailable` and `CorroborationUnavailable` classify failed
/// lookups inside the engine. They are logged and degraded to "no
/// coordinates" / "no posts", so they never escape an ingestion.
#[derive(Error, Debug)]
pub enum ReliefMapError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Report could not be verified as a real disaster event")]
    NotPlausible,

    #[error("Event oracle unavailable: {0}")]
    OracleUnavailable(String),

    #[error("Corroboration search unavailable: {0}")]
    CorroborationUnavailable(String),

    #[error("Geocoder unavailable: {0}")]
    GeocodeUnavailable(String),

    #[error("Event store unavailable: {0}")]
    StoreUnavailable(String),
}

impl ReliefMapError {
    /// Machine-readable error kind returned to clients.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ValidationError",
            Self::NotPlausible => "NotPlausible",
            Self::OracleUnavailable(_) => "OracleUnavailable",
            Self::CorroborationUnavailable(_) => "CorroborationUnavailable",
            Self::GeocodeUnavailable(_) => "GeocodeUnavailable",
            Self::StoreUnavailable(_) => "StoreUnavailable",
        }
    }

    /// True for failures a caller may retry unchanged.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::OracleUnavailable(_)
                | Self::CorroborationUnavailable(_)
                | Self::GeocodeUnavailable(_)
                | Self::StoreUnavailable(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable() {
        assert_eq!(ReliefMapError::NotPlausible.kind(), "NotPlausible");
        assert_eq!(ReliefMapError::Validation("x".into()).kind(), "ValidationError");
        assert_eq!(ReliefMapError::OracleUnavailable("t".into()).kind(), "OracleUnavailable");
        assert_eq!(ReliefMapError::StoreUnavailable("t".into()).kind(), "StoreUnavailable");
        assert_eq!(
            ReliefMapError::GeocodeUnavailable("t".into()).kind(),
            "GeocodeUnavailable"
        );
    }

    #[test]
    fn rejection_is_not_transient() {
        assert!(!ReliefMapError::NotPlausible.is_transient());
        assert!(!ReliefMapError::Validation("x".into()).is_transient());
        assert!(ReliefMapError::OracleUnavailable("timeout".into()).is_transient());
        assert!(ReliefMapError::StoreUnavailable("down".into()).is_transient());
    }
}

use domlogic_core::{Error, OracleResult, Result};
use tracing::debug;

/// Recognized oracle faults read as "no value"; every other fault propagates.
pub fn absent_on_fault<T>(result: OracleResult<T>, subject: &dyn std::fmt::Display) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_recognized() => {
            debug!(subject = %subject, error = %e, "Treating oracle fault as absent value");
            Ok(None)
        }
        Err(e) => Err(Error::Oracle(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domlogic_core::OracleError;

    #[test]
    fn test_asymmetric_propagation() {
        let ok: OracleResult<i32> = Ok(3);
        assert_eq!(absent_on_fault(ok, &"el").unwrap(), Some(3));

        let stale: OracleResult<i32> = Err(OracleError::InvalidElementState("gone".into()));
        assert_eq!(absent_on_fault(stale, &"el").unwrap(), None);

        let server: OracleResult<i32> = Err(OracleError::UnknownServer("500".into()));
        assert_eq!(absent_on_fault(server, &"el").unwrap(), None);

        let broken: OracleResult<i32> = Err(OracleError::Unexpected("closed".into()));
        assert!(matches!(absent_on_fault(broken, &"el"), Err(Error::Oracle(_))));
    }
}

//! ILP reject codes.

/// Error class, given by the first character of the code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum ErrorClass {
    /// `F`: retrying the same packet will fail again.
    Final,
    /// `T`: the packet may succeed if retried later.
    Temporary,
    /// `R`: the packet expired or its condition is invalid.
    Relative,
}

/// Three-character ILP error code carried in a reject.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::IntoStaticStr)] // Into<&'static str>
#[derive(strum::EnumString)] // FromStr, TryFrom<&str>
#[derive(strum::Display)]
#[derive(strum::EnumIter)]
pub enum IlpErrorCode {
    /// Bad request.
    F00,
    /// Invalid packet.
    F01,
    /// Unreachable.
    F02,
    /// Invalid amount.
    F03,
    /// Insufficient destination amount.
    F04,
    /// Wrong condition.
    F05,
    /// Unexpected payment.
    F06,
    /// Cannot receive.
    F07,
    /// Amount too large.
    F08,
    /// Application error.
    F99,
    /// Internal error.
    T00,
    /// Peer unreachable.
    T01,
    /// Peer busy.
    T02,
    /// Connector busy.
    T03,
    /// Insufficient liquidity.
    T04,
    /// Rate limited.
    T05,
    /// Application error.
    T99,
    /// Transfer timed out.
    R00,
    /// Insufficient source amount.
    R01,
    /// Insufficient timeout.
    R02,
    /// Application error.
    R99,
}

impl IlpErrorCode {
    /// Class of this code.
    pub fn class(self) -> ErrorClass {
        let code: &'static str = self.into();
        match code.as_bytes().first() {
            Some(b'T') => ErrorClass::Temporary,
            Some(b'R') => ErrorClass::Relative,
            _ => ErrorClass::Final,
        }
    }

    pub fn is_final(self) -> bool {
        self.class() == ErrorClass::Final
    }

    pub fn is_temporary(self) -> bool {
        self.class() == ErrorClass::Temporary
    }

    pub fn is_relative(self) -> bool {
        self.class() == ErrorClass::Relative
    }

    /// Whether a probe rejected with this code is worth resending.
    pub fn is_retryable(self) -> bool {
        !self.is_final()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_parse_and_display() {
        assert_eq!("F08".parse::<IlpErrorCode>().unwrap(), IlpErrorCode::F08);
        assert_eq!(IlpErrorCode::T04.to_string(), "T04");
        assert!("F42".parse::<IlpErrorCode>().is_err());
    }

    #[test]
    fn test_classes() {
        assert!(IlpErrorCode::F08.is_final());
        assert!(IlpErrorCode::F99.is_final());
        assert!(IlpErrorCode::T02.is_temporary());
        assert!(IlpErrorCode::R00.is_relative());
        assert!(IlpErrorCode::R00.is_retryable());
        assert!(!IlpErrorCode::F02.is_retryable());
    }

    #[test]
    fn test_every_code_is_three_chars() {
        for code in IlpErrorCode::iter() {
            let text: &'static str = code.into();
            assert_eq!(text.len(), 3);
        }
    }
}

//! Error kind → response status mapping.

use core::str::FromStr;

use usersvc_core::ErrorKind;

/// How failures are turned into status codes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum StatusPolicy {
    /// Every domain or input error is a 400; clients tell failures apart by
    /// the message text only.
    #[default]
    Collapsed,
    /// Status reflects the error kind: 400 invalid input, 404 not found,
    /// 409 rejected conditional write, 503 store unavailable, 500 corrupt record.
    Typed,
}

impl StatusPolicy {
    pub fn status_for(self, kind: ErrorKind) -> u16 {
        match self {
            StatusPolicy::Collapsed => 400,
            StatusPolicy::Typed => match kind {
                ErrorKind::InvalidInput => 400,
                ErrorKind::NotFound => 404,
                ErrorKind::StoreWriteRejected => 409,
                ErrorKind::StoreUnavailable => 503,
                ErrorKind::Deserialization => 500,
            },
        }
    }
}

impl FromStr for StatusPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "collapsed" => Ok(StatusPolicy::Collapsed),
            "typed" => Ok(StatusPolicy::Typed),
            other => Err(format!("unknown status mapping '{other}' (expected collapsed or typed)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KINDS: [ErrorKind; 5] = [
        ErrorKind::InvalidInput,
        ErrorKind::NotFound,
        ErrorKind::StoreWriteRejected,
        ErrorKind::StoreUnavailable,
        ErrorKind::Deserialization,
    ];

    #[test]
    fn collapsed_maps_everything_to_bad_request() {
        for kind in ALL_KINDS {
            assert_eq!(StatusPolicy::Collapsed.status_for(kind), 400);
        }
    }

    #[test]
    fn typed_distinguishes_kinds() {
        let statuses: Vec<u16> = ALL_KINDS.iter().map(|k| StatusPolicy::Typed.status_for(*k)).collect();
        assert_eq!(statuses, vec![400, 404, 409, 503, 500]);
    }

    #[test]
    fn parses_policy_names() {
        assert_eq!("typed".parse::<StatusPolicy>(), Ok(StatusPolicy::Typed));
        assert_eq!("Collapsed".parse::<StatusPolicy>(), Ok(StatusPolicy::Collapsed));
        assert!("strict".parse::<StatusPolicy>().is_err());
    }
}

use thiserror::Error;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliInvocation {
    PrintHelp,
    PrintVersion,
    Tui,
}

#[derive(Debug, Error)]
pub enum CliParseError {
    #[error("unknown argument: {0}")]
    UnknownArgument(String),
}

pub fn parse_invocation(args: &[String]) -> Result<CliInvocation, CliParseError> {
    let mut rest = args.iter().skip(1);
    match rest.next().map(String::as_str) {
        None => Ok(CliInvocation::Tui),
        Some("--help") | Some("-h") => Ok(CliInvocation::PrintHelp),
        Some("--version") | Some("-V") => Ok(CliInvocation::PrintVersion),
        Some(other) => Err(CliParseError::UnknownArgument(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn bare_invocation_starts_the_tui() {
        assert_eq!(
            parse_invocation(&args(&["solace"])).expect("parse"),
            CliInvocation::Tui
        );
    }

    #[test]
    fn help_and_version_flags_parse() {
        assert_eq!(
            parse_invocation(&args(&["solace", "--help"])).expect("parse"),
            CliInvocation::PrintHelp
        );
        assert_eq!(
            parse_invocation(&args(&["solace", "-V"])).expect("parse"),
            CliInvocation::PrintVersion
        );
    }

    #[test]
    fn unknown_argument_is_rejected() {
        assert!(parse_invocation(&args(&["solace", "--serve"])).is_err());
    }
}

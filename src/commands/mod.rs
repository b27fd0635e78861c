//! Text command surface
//!
//! Commands are plain chat messages with a configured prefix. Parsing is
//! separate from execution so the router only ever sees a typed command.

pub mod router;

pub use router::CommandRouter;

/// A recognized text command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Check eligibility, grant the member role and affiliation tag
    Verify,
    /// Opt into the notification role
    PingMe,
    /// Opt out of the notification role
    NoPing,
    /// Report queue size and ongoing matches for the channel's hub
    Matches,
    /// Start the recurring queue window schedule (operator only)
    AutoWindowOn,
    /// Stop the recurring queue window schedule (operator only)
    AutoWindowOff,
}

impl Command {
    /// Parse a message body into a command, if it carries one
    pub fn parse(prefix: &str, content: &str) -> Option<Command> {
        let rest = content.strip_prefix(prefix)?;
        let word = rest.split_whitespace().next()?;
        match word.to_ascii_lowercase().as_str() {
            "verify" => Some(Command::Verify),
            "pingme" => Some(Command::PingMe),
            "noping" => Some(Command::NoPing),
            "matches" => Some(Command::Matches),
            "autowindowon" => Some(Command::AutoWindowOn),
            "autowindowoff" => Some(Command::AutoWindowOff),
            _ => None,
        }
    }

    /// Stable command label for logging and metrics
    pub fn name(&self) -> &'static str {
        match self {
            Command::Verify => "verify",
            Command::PingMe => "pingme",
            Command::NoPing => "noping",
            Command::Matches => "matches",
            Command::AutoWindowOn => "autowindowon",
            Command::AutoWindowOff => "autowindowoff",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_commands() {
        assert_eq!(Command::parse(".", ".verify"), Some(Command::Verify));
        assert_eq!(Command::parse(".", ".matches"), Some(Command::Matches));
        assert_eq!(Command::parse(".", ".PINGME"), Some(Command::PingMe));
        assert_eq!(
            Command::parse(".", ".autowindowon now"),
            Some(Command::AutoWindowOn)
        );
    }

    #[test]
    fn ignores_unprefixed_and_unknown_input() {
        assert_eq!(Command::parse(".", "verify"), None);
        assert_eq!(Command::parse(".", ".unknown"), None);
        assert_eq!(Command::parse(".", "."), None);
        assert_eq!(Command::parse(".", "just chatting"), None);
    }

    #[test]
    fn respects_custom_prefix() {
        assert_eq!(Command::parse("!", "!noping"), Some(Command::NoPing));
        assert_eq!(Command::parse("!", ".noping"), None);
    }
}

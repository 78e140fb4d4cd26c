use crate::errors::{ParseError, Result, UtilsError};

/// Trait for parsing different types of commands/inputs
pub trait Parser<T> {
    type Output;

    fn parse(&self, input: &str) -> Result<Self::Output>;
}

/// Connection details pulled out of a pod's `ssh_connect_cmd`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    pub host: String,
    pub port: u16,
    pub user: String,
}

impl SshTarget {
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }
}

/// SSH command parser. `default_user` applies when the command names no
/// user through `user@host` or `-l`.
#[derive(Debug, Clone)]
pub struct SshCommandParser {
    pub default_user: String,
}

impl SshCommandParser {
    pub fn with_default_user(user: impl Into<String>) -> Self {
        Self {
            default_user: user.into(),
        }
    }
}

impl Default for SshCommandParser {
    fn default() -> Self {
        Self::with_default_user("root")
    }
}

impl Parser<SshTarget> for SshCommandParser {
    type Output = SshTarget;

    /// Accepts e.g. `ssh root@1.2.3.4 -p 40022` or
    /// `ssh -i key -o Opt=x -l ubuntu host`.
    fn parse(&self, ssh_cmd: &str) -> Result<Self::Output> {
        let parts: Vec<&str> = ssh_cmd.split_whitespace().collect();
        let args = match parts.first() {
            Some(&"ssh") => &parts[1..],
            _ => &parts[..],
        };

        let mut port = 22u16;
        let mut login: Option<&str> = None;
        let mut destination: Option<&str> = None;

        let mut i = 0;
        while i < args.len() {
            match args[i] {
                "-p" => {
                    let value = args.get(i + 1).ok_or_else(|| {
                        ParseError::InvalidFormat("Missing port number after -p".to_string())
                    })?;
                    port = value.parse().map_err(|_| {
                        ParseError::InvalidFormat(format!("Invalid port number: {}", value))
                    })?;
                    i += 2;
                }
                "-l" => {
                    login = args.get(i + 1).copied();
                    i += 2;
                }
                "-i" | "-o" | "-F" | "-J" | "-L" | "-R" | "-D" => i += 2,
                flag if flag.starts_with('-') => i += 1,
                part => {
                    if destination.is_none() {
                        destination = Some(part);
                    }
                    i += 1;
                }
            }
        }

        let destination = destination.ok_or_else(|| {
            UtilsError::Parse(ParseError::MissingField(
                "No host found in SSH command".to_string(),
            ))
        })?;

        let (user, host) = match destination.split_once('@') {
            Some((user, host)) if !user.is_empty() && !host.is_empty() => {
                (user.to_string(), host.to_string())
            }
            Some(_) => {
                return Err(UtilsError::Parse(ParseError::InvalidFormat(format!(
                    "Invalid user@host: {}",
                    destination
                ))))
            }
            None => (
                login
                    .map(str::to_string)
                    .unwrap_or_else(|| self.default_user.clone()),
                destination.to_string(),
            ),
        };

        Ok(SshTarget { host, port, user })
    }
}

pub fn parse_ssh_command(ssh_cmd: &str) -> Result<SshTarget> {
    SshCommandParser::default().parse(ssh_cmd)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(host: &str, port: u16, user: &str) -> SshTarget {
        SshTarget {
            host: host.to_string(),
            port,
            user: user.to_string(),
        }
    }

    #[test]
    fn test_ssh_command_parsing() {
        assert_eq!(
            parse_ssh_command("ssh root@192.168.1.10").unwrap(),
            target("192.168.1.10", 22, "root")
        );
        assert_eq!(
            parse_ssh_command("ssh -p 2222 ubuntu@example.com").unwrap(),
            target("example.com", 2222, "ubuntu")
        );
        assert_eq!(
            parse_ssh_command("ssh root@1.2.3.4 -p 40022").unwrap(),
            target("1.2.3.4", 40022, "root")
        );
    }

    #[test]
    fn test_flags_with_values_are_skipped() {
        let parsed = parse_ssh_command(
            "ssh -i ~/.ssh/id_ed25519 -o StrictHostKeyChecking=no -l admin -p 2200 box.local",
        )
        .unwrap();
        assert_eq!(parsed, target("box.local", 2200, "admin"));
        assert_eq!(parsed.destination(), "admin@box.local");
    }

    #[test]
    fn test_default_user_only_fills_gaps() {
        let parser = SshCommandParser::with_default_user("ubuntu");
        assert_eq!(
            parser.parse("ssh -p 2200 10.0.0.5").unwrap(),
            target("10.0.0.5", 2200, "ubuntu")
        );
        assert_eq!(
            parser.parse("ssh root@10.0.0.5").unwrap(),
            target("10.0.0.5", 22, "root")
        );
        assert_eq!(
            parser.parse("ssh -l admin 10.0.0.5").unwrap(),
            target("10.0.0.5", 22, "admin")
        );
        assert_eq!(parse_ssh_command("ssh 10.0.0.5").unwrap().user, "root");
    }

    #[test]
    fn test_invalid_commands() {
        assert!(parse_ssh_command("ssh").is_err());
        assert!(parse_ssh_command("ssh -p").is_err());
        assert!(parse_ssh_command("ssh -p abc host").is_err());
        assert!(parse_ssh_command("ssh @host").is_err());
    }
}

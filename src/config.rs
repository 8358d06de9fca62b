use clap::Parser;

/// Drives an author and a subscriber through a channel on the in-memory transport
#[derive(Debug, Clone, Parser)]
#[command(name = "streams-channel", version, about)]
pub struct Config {
    /// Seed of the author. A random 10-character seed is used when missing
    #[arg(long, env = "STREAMS_SEED")]
    pub seed: Option<String>,

    /// Limit of the public plus masked payloads of a packet, in bytes
    #[arg(long, env = "STREAMS_PAYLOAD_LENGTH", default_value_t = 1024)]
    pub payload_length: usize,

    /// Only allow linking to the latest message of the channel
    #[arg(long, env = "STREAMS_SINGLE_BRANCH")]
    pub single_branch: bool,

    /// Also share a keyload and publish a tagged and a signed packet
    #[arg(long, env = "STREAMS_FULL")]
    pub full: bool,

    /// Log the messages sent and handled by the users
    #[arg(short, long, env = "STREAMS_VERBOSE")]
    pub verbose: bool,
}

impl Config {
    pub fn multi_branching(&self) -> bool {
        !self.single_branch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_a_multi_branch_announcement_only_run() {
        let config = Config::try_parse_from(["streams-channel"]).unwrap();
        assert!(config.multi_branching());
        assert!(!config.full);
        assert_eq!(config.payload_length, 1024);
    }

    #[test]
    fn parses_every_flag() {
        let config = Config::try_parse_from([
            "streams-channel",
            "--seed",
            "AUTHOR9SEED",
            "--payload-length",
            "64",
            "--single-branch",
            "--full",
            "-v",
        ])
        .unwrap();
        assert_eq!(config.seed.as_deref(), Some("AUTHOR9SEED"));
        assert_eq!(config.payload_length, 64);
        assert!(!config.multi_branching());
        assert!(config.full && config.verbose);
    }
}

use std::str::FromStr;

use structopt::StructOpt;

/// Upper bound on the number of major indices added by a single expansion
pub const MAX_MAJOR_EXPANSION: u32 = 50;

/// Size of the subaddress window kept ahead of the highest used index
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lookahead {
    pub major: u32,
    pub minor: u32,
}

impl Default for Lookahead {
    fn default() -> Self {
        Lookahead {
            major: 50,
            minor: 200,
        }
    }
}

/// Which known ring members of an input are attributed to the account
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchPolicy {
    /// Stop at the first known ring member of each input
    FirstMatch,
    /// Record every known ring member
    AllMatches,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        MatchPolicy::AllMatches
    }
}

impl FromStr for MatchPolicy {
    type Err = String;
    fn from_str(data: &str) -> Result<Self, Self::Err> {
        match data {
            "first" => Ok(MatchPolicy::FirstMatch),
            "all" => Ok(MatchPolicy::AllMatches),
            _ => Err(format!("Unknown match policy {}, expected first or all", data)),
        }
    }
}

/// Configuration for identification
#[derive(StructOpt, Debug, Clone)]
#[structopt(rename_all = "kebab-case")]
pub struct Config {
    /// Number of major subaddress indices to keep ahead of the highest one seen
    #[structopt(long, default_value = "50")]
    pub subaddress_lookahead_major: u32,

    /// Number of minor subaddress indices generated for every major index
    #[structopt(long, default_value = "200")]
    pub subaddress_lookahead_minor: u32,

    /// Which known ring members of an input to record (all or first)
    #[structopt(long, default_value = "all")]
    pub input_match_policy: MatchPolicy,
}

impl Config {
    pub fn lookahead(&self) -> Lookahead {
        Lookahead {
            major: self.subaddress_lookahead_major,
            minor: self.subaddress_lookahead_minor,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let lookahead = Lookahead::default();
        Config {
            subaddress_lookahead_major: lookahead.major,
            subaddress_lookahead_minor: lookahead.minor,
            input_match_policy: MatchPolicy::default(),
        }
    }
}

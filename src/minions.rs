//! Minion (DAO plugin) catalogue.

use serde::Serialize;

const DAOHAUS: &str = "DAOhaus";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MinionKind {
    Vanilla,
    Nifty,
    Uber,
    Superfluid,
    Neapolitan,
    Rarible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// Deployable on any network.
    Everywhere,
    /// Factory addresses per chain id.
    Factories(&'static [(u64, &'static str)]),
    Unavailable,
}

#[derive(Debug, Clone, Serialize)]
pub struct MinionInfo {
    pub kind: MinionKind,
    pub title: &'static str,
    pub description: &'static str,
    /// Longer explanation, one paragraph per entry.
    pub info: &'static [&'static str],
    pub publisher: Option<&'static str>,
}

impl MinionKind {
    pub const ALL: [MinionKind; 6] = [
        MinionKind::Vanilla,
        MinionKind::Nifty,
        MinionKind::Uber,
        MinionKind::Superfluid,
        MinionKind::Neapolitan,
        MinionKind::Rarible,
    ];

    pub fn availability(&self) -> Availability {
        match self {
            MinionKind::Vanilla => Availability::Everywhere,
            MinionKind::Nifty => Availability::Factories(&[(100, "0xA6B75C3EBfA5a5F801F634812ABCb6Fd7055fd6d")]),
            MinionKind::Uber => Availability::Factories(&[
                (42, "0x03042577463E3820F9cA6Ca3906BAad599ba9382"),
                (100, "0xf5106077892992B84c33C35CA8763895eb80B298"),
            ]),
            MinionKind::Superfluid => Availability::Factories(&[
                (100, "0xfC86DfDd3b2e560729c78b51dF200384cfe87438"),
                (137, "0x52acf023d38A31f7e7bC92cCe5E68d36cC9752d6"),
                (4, "0x4b168c1a1E729F4c8e3ae81d09F02d350fc905ca"),
            ]),
            MinionKind::Neapolitan => Availability::Factories(&[(100, "0x4b168c1a1E729F4c8e3ae81d09F02d350fc905ca")]),
            MinionKind::Rarible => Availability::Unavailable,
        }
    }

    /// Factory address on `chain_id`, or `None` when the minion cannot be
    /// summoned there. Vanilla minions have no fixed factory.
    pub fn factory(&self, chain_id: u64) -> Option<&'static str> {
        match self.availability() {
            Availability::Factories(list) => list.iter().find(|(id, _)| *id == chain_id).map(|(_, a)| *a),
            _ => None,
        }
    }

    pub fn available_on(&self, chain_id: u64) -> bool {
        match self.availability() {
            Availability::Everywhere => true,
            Availability::Factories(_) => self.factory(chain_id).is_some(),
            Availability::Unavailable => false,
        }
    }

    pub fn info(&self) -> MinionInfo {
        let (title, description, info, publisher): (_, _, &'static [&'static str], _) = match self {
            MinionKind::Vanilla => (
                "Vanilla Minion",
                "Enable one-time interactions with other smart contracts via DAO proposals",
                &[
                    "Want a simple way to execute smart contract calls automatically based on the outcome of your proposals? ",
                    "A vanilla minion is a basic upgrade to your DAO proposals, enabling one-time interactions with other smart contracts once your proposals are passed.",
                ],
                Some(DAOHAUS),
            ),
            MinionKind::Nifty => (
                "Nifty Minion",
                "Upgrade on the Vanilla Minion, enabling proposals to be executed early, if a certain quorum is met.",
                &[
                    "Within 1 proposal, you are also able to fund your Minion Vault from your Treasury, saving on transaction fees and execution time.",
                    "This legacy boost is used for the Nifty Ink Boost, but will soon be phased out to the neapolitan minion.",
                ],
                Some(DAOHAUS),
            ),
            MinionKind::Uber => (
                "Uberhaus Minion",
                "Join and participate in UberHaus - the governance for DAOs of DAOs",
                &[
                    "UberHaus is the DAO of DAOs - governing the ecosystem and roadmap of DAOhaus.",
                    "As the gateway to UberHaus governance, the UberHaus Minion enables you to stake your HAUS tokens, manage delegates, withdraw funds and rage-quit from UberHaus.",
                ],
                Some(DAOHAUS),
            ),
            MinionKind::Superfluid => (
                "Superfluid Minion",
                "Stream Tokens from a minion vault via Superfluid Protocol",
                &[
                    "This minion is a specialized minion used exclusively for Super Fluid",
                    "The SuperFluid Minion helps automate ongoing streams of payments via the SuperFluid Protocol.",
                    "Set it up once, and your payments will be streamed in real-time.",
                ],
                Some(DAOHAUS),
            ),
            MinionKind::Neapolitan => (
                "Neapolitan Minion",
                "Enable multiple interactions with other smart contracts via DAO proposals",
                &[
                    "The Advanced Minion is an upgrade to the Vanilla Minion, enabling you to do multiple smart contract transactions once a proposal is passed.",
                    "With the ability to set quorum levels, transactions can be executed earlier once quorum requirements are met. This is especially useful for advanced DAOs looking to optimise their proposals velocity, as well as expand proposal functionality beyond governance (such as DeFi, NFTs, etc.)",
                ],
                None,
            ),
            MinionKind::Rarible => ("Rarible Minion", "", &[], None),
        };
        MinionInfo { kind: *self, title, description, info, publisher }
    }
}

/// Minions that can be summoned on `chain_id`.
pub fn available_minions(chain_id: u64) -> Vec<MinionInfo> {
    MinionKind::ALL
        .iter()
        .filter(|k| k.available_on(chain_id))
        .map(MinionKind::info)
        .collect()
}

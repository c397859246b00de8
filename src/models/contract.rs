use alloy::primitives::{Address, TxHash, U256};
use serde::{Deserialize, Serialize};

/// A contract to deploy: which artifact, and what to pass to its constructor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContractSpec {
    /// Human-readable name used in logs and reports (e.g. "simple-0")
    pub label: String,
    /// Artifact name, resolved to `<artifacts_dir>/<artifact>.json`
    pub artifact: String,
    /// Constructor arguments, each encoded as a `uint256` word
    #[serde(default)]
    pub constructor_args: Vec<U256>,
}

impl ContractSpec {
    pub fn new(label: impl Into<String>, artifact: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            artifact: artifact.into(),
            constructor_args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, arg: U256) -> Self {
        self.constructor_args.push(arg);
        self
    }
}

/// A contract whose deployment transaction has been mined.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeployedContract {
    pub label: String,
    pub artifact: String,
    pub address: Address,
    #[serde(rename = "txHash")]
    pub tx_hash: Option<TxHash>,
    #[serde(rename = "blockNumber")]
    pub block_number: Option<u64>,
}

impl DeployedContract {
    pub fn from_spec(spec: &ContractSpec, address: Address) -> Self {
        Self {
            label: spec.label.clone(),
            artifact: spec.artifact.clone(),
            address,
            tx_hash: None,
            block_number: None,
        }
    }

    pub fn with_receipt(mut self, tx_hash: Option<TxHash>, block_number: Option<u64>) -> Self {
        self.tx_hash = tx_hash;
        self.block_number = block_number;
        self
    }
}

/// The arena line-up: three `Simple` contenders with ids 0..=2, one `Advanced`
/// and one `Random`.
pub fn default_contenders() -> Vec<ContractSpec> {
    vec![
        ContractSpec::new("simple-0", "Simple").with_arg(U256::from(0)),
        ContractSpec::new("simple-1", "Simple").with_arg(U256::from(1)),
        ContractSpec::new("simple-2", "Simple").with_arg(U256::from(2)),
        ContractSpec::new("advanced", "Advanced"),
        ContractSpec::new("random", "Random"),
    ]
}

//! Wallet management and key handling.
//!
//! The private key is loaded ONLY from the environment and is never logged
//! or serialized. The derived address must match the configured wallet
//! address before any transaction is signed.

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;

use crate::ports::chain::ChainError;

/// Environment variable holding the hex-encoded private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "PRIVATE_KEY";

/// Signing wallet for the swap pipeline.
#[derive(Clone)]
pub struct EvmWallet {
    signer: PrivateKeySigner,
}

impl EvmWallet {
    /// Create a wallet from a hex-encoded private key (with or without the
    /// 0x prefix).
    pub fn from_private_key(private_key_hex: &str) -> Result<Self, ChainError> {
        let key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| ChainError::Wallet(format!("Invalid private key format: {e}")))?;

        Ok(Self { signer })
    }

    /// Load the wallet from the `PRIVATE_KEY` environment variable.
    pub fn from_env() -> Result<Self, ChainError> {
        let private_key = std::env::var(PRIVATE_KEY_ENV_VAR).map_err(|_| {
            ChainError::Wallet(format!(
                "Environment variable {PRIVATE_KEY_ENV_VAR} not set"
            ))
        })?;

        Self::from_private_key(&private_key)
    }

    /// Throwaway wallet for read-only commands that never sign anything.
    pub fn random() -> Self {
        Self {
            signer: PrivateKeySigner::random(),
        }
    }

    /// The address derived from the signing key.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Abort early when the key does not belong to the configured wallet.
    pub fn ensure_matches(&self, configured: Address) -> Result<(), ChainError> {
        let derived = self.address();
        if derived != configured {
            return Err(ChainError::AddressMismatch {
                derived,
                configured,
            });
        }
        Ok(())
    }

    pub(crate) fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }
}

impl std::fmt::Debug for EvmWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only the address; the key stays out of Debug output
        f.debug_struct("EvmWallet")
            .field("address", &self.address())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known test private key (Anvil's first account)
    const TEST_PRIVATE_KEY: &str =
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    #[test]
    fn test_wallet_from_private_key() {
        let wallet = EvmWallet::from_private_key(TEST_PRIVATE_KEY).unwrap();
        assert_eq!(wallet.address().to_string().to_lowercase(), TEST_ADDRESS);
    }

    #[test]
    fn test_wallet_with_0x_prefix() {
        let wallet = EvmWallet::from_private_key(&format!("0x{TEST_PRIVATE_KEY}")).unwrap();
        assert_eq!(wallet.address().to_string().to_lowercase(), TEST_ADDRESS);
    }

    #[test]
    fn test_invalid_private_key() {
        let result = EvmWallet::from_private_key("invalid_key");
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Invalid private key"));
    }

    #[test]
    fn test_ensure_matches() {
        let wallet = EvmWallet::from_private_key(TEST_PRIVATE_KEY).unwrap();
        assert!(wallet.ensure_matches(wallet.address()).is_ok());

        let other = Address::with_last_byte(0x01);
        assert!(matches!(
            wallet.ensure_matches(other),
            Err(ChainError::AddressMismatch { .. })
        ));
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let wallet = EvmWallet::from_private_key(TEST_PRIVATE_KEY).unwrap();
        let debug = format!("{wallet:?}");
        assert!(!debug.to_lowercase().contains(&TEST_PRIVATE_KEY[..16]));
        assert!(debug.contains("address"));
    }
}

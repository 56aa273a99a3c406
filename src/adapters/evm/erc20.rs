//! ERC-20 ABI
//!
//! The five functions the bot needs, as alloy `sol!` bindings. Calldata is
//! encoded here and executed through the provider in `rpc.rs`.

use alloy::primitives::U256;
use alloy::sol;

sol! {
    /// Minimal ERC-20 surface used by the swap pipeline.
    contract IERC20 {
        function decimals() external view returns (uint8);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 value) external returns (bool);
        function transfer(address recipient, uint256 amount) external returns (bool);
    }
}

/// Approval amount granted to the router when the allowance runs short.
/// 2^255, effectively unlimited while staying clear of uint256 max.
pub fn max_approval() -> U256 {
    U256::from(1u8) << 255
}

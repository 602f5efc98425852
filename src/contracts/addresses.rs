//! Built-in contract addresses, overridable from configuration

// Ethereum L1
pub const L1_SUPERCHAIN_CONFIG: &str = "0x95703e0982140D16f8ebA6d158FccEde42f04a4C";
pub const L1_STANDARD_BRIDGE: &str = "0x88FF1e5b602916615391F55854588EFcBB7663f0";
pub const L1_INK_OPTIMISM_PORTAL: &str = "0x5d66C1782664115999C47c9fA5cd031f495D3e4F";
/// Chainlink ETH/USD aggregator, the reference for the L2 push oracle
pub const L1_CHAINLINK_ETH_USD: &str = "0x5f4eC3Df9cbd43714FE2740f5E3616155c5b8419";

// Ink L2
pub const L2_AAVE_PROTOCOL_DATA_PROVIDER: &str = "0x96086C25d13943C80Ff9a19791a40Df6aFC08328";
pub const L2_CHAOS_PUSH_ORACLE: &str = "0x163131609562E578754aF12E998635BfCa56712C";
pub const L2_VARIABLE_DEBT_INK_WL_WETH: &str = "0xc1457AcfBaD2332b07B7651A4Da3176E8F3Bc9E4";
pub const L2_WETH: &str = "0x4200000000000000000000000000000000000006";

// Emergency withdrawal route on L2
pub const L2_WETH_GATEWAY_V3: &str = "0xDe090EfCD6ef4b86792e2D84E55a5fa8d49D25D2";
pub const L2_LENDING_POOL: &str = "0x2816cf15F6d2A220E789aA011D5EE4eB6c47FEbA";
pub const L2_A_INK_WL_WETH: &str = "0x2B35eF056728BaFFaC103e3b81cB029788006EF9";

//! Calldata for the multisig withdrawal batch
//!
//! The Argus module on the Safe executes an ordered list of sub-calls in
//! one transaction. The withdrawal batch is: approve the gateway to spend
//! the aToken, then withdraw the underlying ETH to the Safe.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;

sol! {
    #[allow(missing_docs)]
    struct CallData {
        uint256 flag;
        address to;
        uint256 value;
        bytes data;
        bytes hint;
        bytes extra;
    }

    #[allow(missing_docs)]
    interface IArgusModule {
        function execTransactions(CallData[] calldata callDataList) external;
    }

    #[allow(missing_docs)]
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
    }

    #[allow(missing_docs)]
    interface IWrappedTokenGatewayV3 {
        function withdrawETH(address pool, uint256 amount, address to) external;
    }
}

/// Plain call: flag 0, no value, empty hint and extra
pub fn call(to: Address, data: Vec<u8>) -> CallData {
    CallData {
        flag: U256::ZERO,
        to,
        value: U256::ZERO,
        data: data.into(),
        hint: Bytes::new(),
        extra: Bytes::new(),
    }
}

pub fn approve(spender: Address, amount: U256) -> Vec<u8> {
    IERC20::approveCall { spender, amount }.abi_encode()
}

pub fn withdraw_eth(pool: Address, amount: U256, to: Address) -> Vec<u8> {
    IWrappedTokenGatewayV3::withdrawETHCall { pool, amount, to }.abi_encode()
}

pub fn exec_transactions(calls: Vec<CallData>) -> Bytes {
    IArgusModule::execTransactionsCall { callDataList: calls }
        .abi_encode()
        .into()
}

/// Approve-then-withdraw batch sending `amount` to `safe`
pub fn withdrawal_batch(
    wrapped_token: Address,
    gateway: Address,
    pool: Address,
    safe: Address,
    amount: U256,
) -> Bytes {
    exec_transactions(vec![
        call(wrapped_token, approve(gateway, amount)),
        call(gateway, withdraw_eth(pool, amount, safe)),
    ])
}

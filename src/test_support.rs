//! Fakes shared by unit tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use alloy::primitives::{Address, Bytes};
use async_trait::async_trait;

use crate::chain::abi::selector;
use crate::chain::ChainReader;
use crate::error::{MonitorError, Result};

type Key = (Address, [u8; 4]);

/// Canned `eth_call` answers keyed by (contract, selector)
#[derive(Default)]
pub struct FakeReader {
    answers: Mutex<HashMap<Key, std::result::Result<Bytes, String>>>,
    calls: AtomicUsize,
    last_calldata: Mutex<Option<Bytes>>,
}

impl FakeReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, to: Address, signature: &str, data: Bytes) {
        self.answers
            .lock()
            .unwrap()
            .insert((to, selector(signature)), Ok(data));
    }

    pub fn fail(&self, to: Address, signature: &str, message: &str) {
        self.answers
            .lock()
            .unwrap()
            .insert((to, selector(signature)), Err(message.to_string()));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_calldata(&self) -> Option<Bytes> {
        self.last_calldata.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainReader for FakeReader {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_calldata.lock().unwrap() = Some(data.clone());

        let mut sel = [0u8; 4];
        sel.copy_from_slice(&data[..4]);

        match self.answers.lock().unwrap().get(&(to, sel)) {
            Some(Ok(bytes)) => Ok(bytes.clone()),
            Some(Err(message)) => Err(MonitorError::Rpc(message.clone())),
            None => Err(MonitorError::Rpc(format!("no canned answer for {to}"))),
        }
    }
}

//! The one example handler shipped with the binary: `myapp.add`, summing
//! its numeric args. Grounded on `original_source/demo/main.go`'s `Adder`
//! (the artificial 5-second sleep in that source is demo throttling, not
//! core behaviour, and is dropped here).

use async_trait::async_trait;
use stevedore_proto::{CeleryValue, TaskEnvelope};
use stevedore_worker::{Handler, HandlerError};

pub struct Adder;

#[async_trait]
impl Handler for Adder {
    async fn call(&self, task: &TaskEnvelope) -> Result<Option<CeleryValue>, HandlerError> {
        let mut sum = 0.0;
        for arg in &task.args {
            sum += arg.as_f64().map_err(|err| HandlerError::Failed(err.into()))?;
        }
        Ok(Some(CeleryValue::Number(sum)))
    }
}

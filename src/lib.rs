//! # rsketch
//!
//! Turns a hand-drawn PNG sketch and a text prompt into a generated image by
//! driving the LightX sketch-to-image workflow: request an upload slot,
//! upload the sketch, submit the job, poll its status, download the result.
//!
//! ```no_run
//! use rsketch::{GenerateForm, LightXClient, LightXConfig, Orchestrator};
//! use std::sync::Arc;
//!
//! # async fn example() -> rsketch::Result<()> {
//! let config = LightXConfig::from_env()?;
//! let client = LightXClient::new(&config)?;
//! let orchestrator = Orchestrator::new(Arc::new(client), config.poll.clone());
//!
//! let png = std::fs::read("sketch.png").unwrap();
//! let form = GenerateForm::new("a red bicycle", rsketch::validation::to_data_uri(&png));
//! let image = orchestrator.run(&form).await?;
//! std::fs::write(image.filename, &image.data).unwrap();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod lightx;
pub mod logger;
pub mod models;
pub mod pipeline;
#[cfg(feature = "server")]
pub mod server;
pub mod validation;

pub use config::{LightXConfig, ServerConfig, Timeouts};
pub use error::{ErrorKind, FailureOrigin, ProviderFailure, Result, SketchError};
pub use lightx::{Backoff, LightXClient, RetryPolicy, SketchProvider};
pub use models::*;
pub use pipeline::{Orchestrator, PollPolicy, Stage};

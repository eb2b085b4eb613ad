//! Command-line and environment configuration.

use std::fmt;
use std::path::PathBuf;

use actix_cors::Cors;
use clap::Parser;

use crate::preprocess::DEFAULT_INPUT_SIZE;

/// Potato leaf disease classification server
#[derive(Parser, Debug, Clone)]
#[command(name = "potato-disease-api")]
#[command(version)]
#[command(about = "HTTP API classifying potato leaf images as Early Blight, Late Blight or Healthy")]
pub struct Cli {
    /// Host to bind to
    #[arg(long, env = "POTATO_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "POTATO_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Path to the ONNX model
    #[arg(short, long, env = "POTATO_MODEL_PATH", default_value = "potatoes.onnx")]
    pub model_path: PathBuf,

    /// Side length the model expects its square RGB input at
    #[arg(
        long,
        env = "POTATO_INPUT_SIZE",
        default_value_t = DEFAULT_INPUT_SIZE,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub input_size: u32,

    /// Serve fixed mock predictions instead of loading the model
    #[arg(
        long,
        env = "POTATO_MOCK",
        action = clap::ArgAction::SetTrue,
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub mock: bool,

    /// Allowed CORS origin; repeat for several, `*` allows any
    #[arg(
        long = "cors-origin",
        env = "POTATO_CORS_ORIGINS",
        value_delimiter = ',',
        default_values_t = default_origins()
    )]
    pub cors_origins: Vec<String>,

    /// Largest accepted upload in bytes
    #[arg(long, env = "POTATO_MAX_UPLOAD_BYTES", default_value_t = 10 * 1024 * 1024)]
    pub max_upload_bytes: usize,

    /// Number of HTTP workers (defaults to one per core)
    #[arg(long, env = "POTATO_WORKERS")]
    pub workers: Option<usize>,
}

fn default_origins() -> Vec<String> {
    vec![
        "http://localhost".to_string(),
        "http://localhost:3000".to_string(),
        "http://localhost:8080".to_string(),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Model,
    Mock,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Model => "model",
            Mode::Mock => "mock",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings handlers need at request time.
#[derive(Debug, Clone)]
pub struct Settings {
    pub mode: Mode,
    pub input_size: u32,
    pub max_upload_bytes: usize,
}

impl Cli {
    pub fn mode(&self) -> Mode {
        if self.mock {
            Mode::Mock
        } else {
            Mode::Model
        }
    }

    pub fn settings(&self) -> Settings {
        Settings {
            mode: self.mode(),
            input_size: self.input_size,
            max_upload_bytes: self.max_upload_bytes,
        }
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o.trim() == "*")
    }

    pub fn cors(&self) -> Cors {
        if self.allows_any_origin() {
            return Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header();
        }

        self.cors_origins
            .iter()
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allow_any_method()
            .allow_any_header()
            .supports_credentials()
    }
}

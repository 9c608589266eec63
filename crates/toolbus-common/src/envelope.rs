//! Wire envelopes for command traffic.
//!
//! Every hop in the system speaks the same two shapes: a [`CommandEnvelope`]
//! on the way in and a [`ResultEnvelope`] on the way out. The routing
//! namespace is derived from the command name via a static table; it is never
//! taken from caller input, so callers cannot steer a command to a backend it
//! was not registered for.

use crate::errors::Error;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A single command request.
///
/// Immutable once sent; carries no identity beyond the one request/response
/// exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub command: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl CommandEnvelope {
    pub fn new(command: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            command: command.into(),
            params,
        }
    }

    /// Boundary validation: the command name must be non-empty.
    pub fn validate(&self) -> Result<(), Error> {
        if self.command.trim().is_empty() {
            return Err(Error::validation("command must not be empty"));
        }
        Ok(())
    }

    /// The namespace this command is registered under.
    pub fn namespace(&self) -> Namespace {
        Namespace::of(&self.command)
    }
}

/// Routing namespace for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    AssetAuthoring,
    Engine,
    Generative,
    Unknown,
}

impl Namespace {
    /// Static command-name -> namespace table.
    ///
    /// Commands not listed here are `Unknown` and are rejected by the router
    /// without any network traffic.
    pub fn of(command: &str) -> Namespace {
        match command {
            // Asset-authoring backend (mesh/material work)
            "generate_scene" | "add_object" | "modify_object" | "optimize_asset"
            | "export_asset" | "import_asset" => Namespace::AssetAuthoring,

            // Engine backend (level/actor work)
            "create_level" | "create_blueprint" | "generate_terrain" | "place_foliage"
            | "build_lighting" | "place_actor" | "set_game_mode" | "save_level" => {
                Namespace::Engine
            }

            // Generative provider
            "generate_content" | "generate_texture" | "generate_blueprint_script" => {
                Namespace::Generative
            }

            _ => Namespace::Unknown,
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::AssetAuthoring => write!(f, "asset"),
            Namespace::Engine => write!(f, "engine"),
            Namespace::Generative => write!(f, "generative"),
            Namespace::Unknown => write!(f, "unknown"),
        }
    }
}

/// Outcome marker on every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandStatus {
    Success,
    Error,
}

/// A single command response.
///
/// Every response the router or client library produces is one of these,
/// including synthesized fallbacks and locally detected failures. Raw
/// transport errors never reach a caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub status: CommandStatus,
    pub message: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl ResultEnvelope {
    pub fn success(message: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            status: CommandStatus::Success,
            message: message.into(),
            data,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Error,
            message: message.into(),
            data: Map::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == CommandStatus::Success
    }
}

//! Cadenza Daemon Library
//!
//! Headless host for the playback control core: production adapters for
//! every collaborator trait, configuration loading and stdin command
//! parsing. The `cadenzad` binary wires these together.
//!
//! This library exposes the components for testing purposes.

pub mod config;
pub mod engine;
pub mod error;
pub mod focus;
pub mod input;
pub mod library;
pub mod session;
pub mod settings;
pub mod store;

// Re-export commonly used types for convenience
pub use config::DaemonConfig;
pub use engine::NullSinkEngine;
pub use error::{DaemonError, Result};
pub use focus::DesktopFocus;
pub use library::{CatalogEntry, CatalogLibrary};
pub use session::JsonLinesSession;
pub use settings::TomlSettings;
pub use store::JsonQueueStore;

use cadenza_playback::{Collaborators, SessionTransport};

/// Build the production collaborators described by `config`
///
/// Session updates go to `session`; the binary passes a stdout transport.
pub fn collaborators(
    config: &DaemonConfig,
    session: Box<dyn SessionTransport>,
) -> Result<Collaborators> {
    let library = CatalogLibrary::load(&config.paths.library)?;
    let engine = NullSinkEngine::new(library.lengths());

    Ok(Collaborators {
        engine: Box::new(engine),
        focus: Box::new(DesktopFocus::new()),
        session,
        library: Box::new(library),
        store: Box::new(JsonQueueStore::new(&config.paths.snapshot)),
        settings: Box::new(TomlSettings::new(
            config.player.clone(),
            config.source.clone(),
        )),
    })
}

//! Progress reporting
//!
//! The provisioner describes what it does as [`ProvisionEvent`]s and hands
//! them to a [`Reporter`]. [`ConsoleReporter`] prints them for an operator;
//! every event also goes to the tracing log.

use std::error::Error as _;
use std::sync::Mutex;

use crate::error::ProvisionError;
use crate::resource::{BatchSummary, ResourceDescriptor, ResourceKind, ResourceSpec};

/// Level of detail for console output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DetailLevel {
    /// One line per event
    Minimal,
    /// Adds comment and kind-specific attributes of created objects
    #[default]
    Detailed,
    /// Adds attributes of existing objects and full error chains
    Verbose,
}

/// Something that happened while provisioning one object
#[derive(Debug)]
pub enum ProvisionEvent<'a> {
    /// An object with the requested name is already present
    AlreadyExists(&'a ResourceDescriptor),
    /// The name is free and a create call is about to be issued
    Creating(&'a ResourceSpec),
    Created(&'a ResourceDescriptor),
    /// The existence check failed for a reason other than absence
    LookupFailed {
        kind: ResourceKind,
        name: &'a str,
        error: &'a ProvisionError,
    },
    CreationFailed {
        kind: ResourceKind,
        name: &'a str,
        error: &'a ProvisionError,
    },
}

impl ProvisionEvent<'_> {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::AlreadyExists(descriptor) | Self::Created(descriptor) => descriptor.kind(),
            Self::Creating(spec) => spec.kind(),
            Self::LookupFailed { kind, .. } | Self::CreationFailed { kind, .. } => *kind,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::LookupFailed { .. } | Self::CreationFailed { .. })
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::AlreadyExists(_) => "=",
            Self::Creating(_) => "↻",
            Self::Created(_) => "✓",
            Self::LookupFailed { .. } | Self::CreationFailed { .. } => "✗",
        }
    }

    /// Headline for this event, without attribute lines
    pub fn message(&self) -> String {
        let kind = self.kind();
        match self {
            Self::AlreadyExists(descriptor) => format!(
                "{} '{}' already exists. Skipping creation.",
                kind.title(),
                descriptor.name()
            ),
            Self::Creating(spec) => match spec.attributes() {
                crate::resource::SpecAttributes::Metastore { region, .. } => format!(
                    "{} {} '{}' in region '{}'...",
                    kind.present_participle(),
                    kind,
                    spec.name(),
                    region
                ),
                _ => format!("{} {} '{}'...", kind.present_participle(), kind, spec.name()),
            },
            Self::Created(descriptor) => format!(
                "Successfully {} {}: {}",
                kind.past_tense(),
                kind,
                descriptor.name()
            ),
            Self::LookupFailed { name, error, .. } => format!(
                "Error checking whether {} '{}' exists: {}",
                kind,
                name,
                root_cause(error)
            ),
            Self::CreationFailed { error, .. } => {
                format!("Error {} {}: {}", kind.gerund(), kind, root_cause(error))
            }
        }
    }

    /// Headline followed by indented detail lines, as printed on the console
    pub fn lines(&self, detail_level: DetailLevel) -> Vec<String> {
        let mut lines = vec![self.message()];
        if detail_level == DetailLevel::Minimal {
            return lines;
        }

        let descriptor = match self {
            Self::Created(descriptor) => Some(descriptor),
            Self::AlreadyExists(descriptor) if detail_level == DetailLevel::Verbose => {
                Some(descriptor)
            }
            _ => None,
        };

        if let Some(descriptor) = descriptor {
            for (label, value) in descriptor.details() {
                lines.push(format!("{}: {}", label, value));
            }
            if let Some(comment) = descriptor.comment() {
                lines.push(format!("Comment: {}", comment));
            }
        }

        if detail_level == DetailLevel::Verbose {
            if let Self::LookupFailed { error, .. } | Self::CreationFailed { error, .. } = self {
                let mut source = error.source();
                while let Some(cause) = source {
                    lines.push(format!("  caused by: {}", cause));
                    source = cause.source();
                }
            }
        }

        lines
    }
}

/// The innermost message of an error chain; the outer layers repeat kind and name
fn root_cause(error: &ProvisionError) -> String {
    match error.api_error() {
        Some(api_error) => api_error.to_string(),
        None => error.to_string(),
    }
}

/// Sink for provisioning progress
pub trait Reporter {
    fn report(&self, event: &ProvisionEvent<'_>);
}

impl<R: Reporter + ?Sized> Reporter for &R {
    fn report(&self, event: &ProvisionEvent<'_>) {
        (**self).report(event)
    }
}

fn trace_event(event: &ProvisionEvent<'_>) {
    if event.is_failure() {
        tracing::error!(kind = %event.kind(), "{}", event.message());
    } else {
        tracing::info!(kind = %event.kind(), "{}", event.message());
    }
}

/// Prints events to stdout (failures to stderr)
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter {
    pub detail_level: DetailLevel,
}

impl ConsoleReporter {
    pub fn new(detail_level: DetailLevel) -> Self {
        Self { detail_level }
    }

    /// Print the outcome of a batch
    pub fn summary(&self, summary: &BatchSummary) {
        println!();
        println!("{}", summary.headline());
        if self.detail_level != DetailLevel::Minimal {
            for (kind, name, error) in &summary.failed {
                eprintln!("  ✗ {} '{}': {}", kind, name, error);
            }
        }
    }
}

/// Console stream a rendered line goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl ConsoleReporter {
    /// Lines printed for an event; a blank line separates each new creation
    pub fn render(&self, event: &ProvisionEvent<'_>) -> Vec<(Stream, String)> {
        let stream = if event.is_failure() {
            Stream::Stderr
        } else {
            Stream::Stdout
        };

        let mut rendered = Vec::new();
        if matches!(event, ProvisionEvent::Creating(_)) {
            rendered.push((Stream::Stdout, String::new()));
        }
        rendered.extend(
            event
                .lines(self.detail_level)
                .into_iter()
                .map(|line| (stream, line)),
        );
        rendered
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, event: &ProvisionEvent<'_>) {
        trace_event(event);

        for (stream, line) in self.render(event) {
            match stream {
                Stream::Stdout => println!("{}", line),
                Stream::Stderr => eprintln!("{}", line),
            }
        }
    }
}

/// Keeps the rendered headline of every event, in order
#[derive(Debug, Default)]
pub struct RecordingReporter {
    messages: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, event: &ProvisionEvent<'_>) {
        trace_event(event);
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(format!("{} {}", event.icon(), event.message()));
        }
    }
}

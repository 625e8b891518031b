//! Calendar event synthesis and the Google Calendar API client.

pub mod client;
pub mod synth;

pub use client::{CalendarClient, CalendarSink};
pub use synth::{synthesize, SynthesisPolicy};

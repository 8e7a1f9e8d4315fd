//! `Sink`: the interface point a syslog/journald adapter would implement,
//! plus the stderr and syslog-line-formatting sinks this daemon ships with.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

mod record;
mod sink;

pub use record::Record;
pub use sink::{Sink, StderrSink, SyslogStyleSink};

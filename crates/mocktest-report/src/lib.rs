//! mocktest-report: Results page generation for submitted attempts.

pub mod html;

//! The report document.
//!
//! One page per suite, every run is appended as soon as it finished and the
//! writer is flushed, so a report cut short still shows all completed runs.

use std::{fmt, io};

use crate::{
    formatter::{
        common::{NO_TESTS, tier_class},
        *,
    },
    report::TIME_FORMAT,
};

const STYLE: &str = r#"
.test {
	clear: both;
}
.test table {
	width: 100%;
	border-collapse: collapse;
}
.test tr {
	height: 1em;
}
.test td.ok:nth-child(2n) {
	background: green;
}
.test td.ok:nth-child(2n+1) {
	background: forestgreen;
}
.test td.ok:hover {
	background: limegreen;
}
.test .test_count {
	float: right;
}
.ok {
	background: forestgreen;
	color: white;
	border-radius: 2px;
}
.mid {
	background: orange;
	border-radius: 2px;
}
.fail {
	background: red;
	border-radius: 2px;
}
.fail[title]:hover {
	background: orangered;
}
.info {
	float: right;
	border: 1px solid #eee;
	border-radius: 5px;
	margin-top: 0px;
	margin-bottom: -2em;
	box-shadow: 0px 2px 2px rgba(0,0,0,0.5);
	position: relative;
	top: -3em;
}
.cmd {
	clear: both;
}
hr {
	clear: both;
	width: 50%;
	height: 1px;
	border-collapse: collapse;
}
"#;

/// Escapes text for use in element content and quoted attributes.
#[derive(Debug, Clone, Copy)]
pub struct Escaped<'t>(pub &'t str);

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rest = self.0;
        while let Some(pos) = rest.find(['&', '<', '>', '"', '\'']) {
            f.write_str(&rest[..pos])?;
            f.write_str(match rest.as_bytes()[pos] {
                b'&' => "&amp;",
                b'<' => "&lt;",
                b'>' => "&gt;",
                b'"' => "&quot;",
                _ => "&#39;",
            })?;
            rest = &rest[pos + 1..];
        }
        f.write_str(rest)
    }
}

#[derive(Debug)]
pub struct HtmlFormatter<W: io::Write> {
    target: W,
}

impl<W: io::Write> HtmlFormatter<W> {
    pub fn new(target: W) -> Self {
        Self { target }
    }

    pub fn into_target(self) -> W {
        self.target
    }
}

impl<W: io::Write> ReportFormatter for HtmlFormatter<W> {
    type Error = io::Error;

    fn fmt_suite_start(&mut self, data: FmtSuiteStart) -> io::Result<()> {
        let started_at = data.started_at.format(TIME_FORMAT);
        writeln!(self.target, "<!DOCTYPE html>")?;
        writeln!(
            self.target,
            "<html><head><meta charset=\"utf-8\"><title>CTest results</title>"
        )?;
        writeln!(self.target, "<style>{STYLE}</style></head><body>")?;
        writeln!(self.target, "<h1>CTest results: {started_at}</h1>")?;
        writeln!(self.target, "<div style=\"clear: both;\"></div>")?;
        self.target.flush()
    }

    fn fmt_run_outcome(&mut self, FmtRunOutcome { run }: FmtRunOutcome<'_>) -> io::Result<()> {
        let w = &mut self.target;
        let executable = run.target.executable.to_string_lossy();
        write!(w, "<div class=\"cmd\">")?;
        write!(w, "<h2>{}</h2>", Escaped(&executable))?;
        write!(
            w,
            "<div class=\"info\">{}<br/>",
            run.started_at.format(TIME_FORMAT)
        )?;

        let totals = run.totals();
        match (totals.success_rate(), totals.tier()) {
            (Some(rate), Some(tier)) => write!(
                w,
                "{}/{}; <span class=\"{}\">{rate:.2} % Success rate.</span>",
                totals.ok,
                totals.total(),
                tier_class(tier)
            )?,
            _ => write!(w, "<b class=\"fail\">{NO_TESTS}</b>")?,
        }

        if run.exit.is_abnormal() {
            write!(
                w,
                "<br/><b class=\"fail\">Process did not finish properly. {}</b>",
                run.exit
            )?;
        }
        if let Some(err) = &run.error {
            write!(w, "<br/><b class=\"fail\">{}</b>", Escaped(&err.to_string()))?;
        }
        for violation in &run.violations {
            write!(
                w,
                "<br/><b class=\"fail\">{}</b>",
                Escaped(&violation.to_string())
            )?;
        }
        if run.malformed_lines > 0 {
            write!(
                w,
                "<br/>{} malformed protocol line(s)",
                run.malformed_lines
            )?;
        }
        writeln!(w, "</div>")?;

        for group in &run.groups {
            write!(
                w,
                "<div class=\"test\"><b>{}</b><span class=\"test_count\">{} tests</span>",
                Escaped(group.name()),
                group.len()
            )?;
            write!(w, "<table class=\"test\"><tr>")?;
            for assertion in group.detail() {
                write!(
                    w,
                    "<td class=\"{}\" title=\"{}\"></td>",
                    assertion.status,
                    Escaped(&assertion.label)
                )?;
            }
            writeln!(w, "</tr></table></div>")?;
        }

        writeln!(w, "<hr/></div>")?;
        w.flush()
    }

    fn fmt_suite_end(&mut self, _: FmtSuiteEnd<'_>) -> io::Result<()> {
        writeln!(self.target, "</body></html>")?;
        self.target.flush()
    }
}

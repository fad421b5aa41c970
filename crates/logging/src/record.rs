//! crates/logging/src/record.rs
//! Log records, call-site capture, and the byte-level record layout.

use std::borrow::Cow;
use std::fmt;
use std::time::SystemTime;

use crate::severity::Severity;

/// Text logged when a caller supplied no message at all.
pub const MISSING_TEXT_PLACEHOLDER: &str = "<no log message text supplied>";

/// Rendered in place of a function name that could not be determined.
pub const UNKNOWN_FUNCTION: &str = "unknown";

/// Function and line that invoked the emitter.
///
/// Built with [`call_site!`](crate::call_site) in Rust code, or from the
/// values a shell script passes in (`${FUNCNAME[1]}`, `${BASH_LINENO[0]}`).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CallSite {
    function: Option<Cow<'static, str>>,
    line: u32,
}

impl CallSite {
    /// Creates a call site from an explicit function name and line.
    #[must_use]
    pub fn new(function: impl Into<Cow<'static, str>>, line: u32) -> Self {
        let function = function.into();
        Self {
            function: (!function.is_empty()).then_some(function),
            line,
        }
    }

    /// A call site with neither function nor line.
    #[must_use]
    pub const fn unknown() -> Self {
        Self {
            function: None,
            line: 0,
        }
    }

    /// Creates a call site with only a line number.
    #[must_use]
    pub const fn at_line(line: u32) -> Self {
        Self {
            function: None,
            line,
        }
    }

    /// Derives the function name from the type name of a marker item nested in it.
    ///
    /// `path::to::function::{{closure}}::__here` becomes `function`.
    #[doc(hidden)]
    #[must_use]
    pub fn from_marker_type_name(type_name: &'static str, line: u32) -> Self {
        let mut path = type_name.strip_suffix("::__here").unwrap_or(type_name);
        while let Some(stripped) = path.strip_suffix("::{{closure}}") {
            path = stripped;
        }
        let function = path.rsplit("::").next().unwrap_or(path);
        Self::new(function, line)
    }

    /// The calling function, if known.
    #[must_use]
    pub fn function(&self) -> Option<&str> {
        self.function.as_deref()
    }

    /// The calling source line, `0` when unknown.
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }
}

/// Captures the enclosing function name and current line as a [`CallSite`].
///
/// # Examples
///
/// ```
/// fn rotate_backups() -> logging::CallSite {
///     logging::call_site!()
/// }
///
/// assert_eq!(rotate_backups().function(), Some("rotate_backups"));
/// ```
#[macro_export]
macro_rules! call_site {
    () => {{
        fn __here() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        $crate::CallSite::from_marker_type_name(__type_name_of(__here), ::std::line!())
    }};
}

/// One logging request, created at the call site and consumed synchronously.
#[derive(Clone, Debug)]
pub struct LogRecord<'a> {
    severity: Severity,
    text: &'a str,
    timestamp: SystemTime,
    process_id: u32,
    module_name: &'a str,
    site: &'a CallSite,
}

impl<'a> LogRecord<'a> {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(
        severity: Severity,
        text: &'a str,
        process_id: u32,
        module_name: &'a str,
        site: &'a CallSite,
    ) -> Self {
        Self {
            severity,
            text,
            timestamp: SystemTime::now(),
            process_id,
            module_name,
            site,
        }
    }

    /// Severity the record was logged at.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// Unprocessed message text.
    #[must_use]
    pub const fn text(&self) -> &'a str {
        self.text
    }

    /// Creation time.
    #[must_use]
    pub const fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    /// Process the record is logged on behalf of.
    #[must_use]
    pub const fn process_id(&self) -> u32 {
        self.process_id
    }

    /// Module or script name.
    #[must_use]
    pub const fn module_name(&self) -> &'a str {
        self.module_name
    }

    /// Function and line that produced the record.
    #[must_use]
    pub const fn site(&self) -> &'a CallSite {
        self.site
    }

    /// Renders the header and `physical_line` in the transport layout.
    ///
    /// `<SEVERITY> (PID: <pid> , MN: <module> , FN: <function> , LI: <line>):    <physical_line>`
    #[must_use]
    pub fn format_line(&self, physical_line: &str) -> String {
        FormattedLine {
            record: self,
            physical_line,
        }
        .to_string()
    }
}

struct FormattedLine<'r, 'a> {
    record: &'r LogRecord<'a>,
    physical_line: &'r str,
}

impl fmt::Display for FormattedLine<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.record;
        write!(
            f,
            "{} (PID: {} , MN: {} , FN: {} , LI: {}):    {}",
            record.severity.as_upper(),
            record.process_id,
            record.module_name,
            record.site.function().unwrap_or(UNKNOWN_FUNCTION),
            record.site.line(),
            self.physical_line,
        )
    }
}

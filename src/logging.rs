use std::fmt;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Prints `LEVEL module::function [span::stack]: message key=value`.
///
/// The function name comes from the `function` field that the `log_*!` macros
/// attach; plain `tracing` events fall back to the module path alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct FunctionFormatter;

#[derive(Default)]
struct EventVisitor {
    message: Option<String>,
    function: Option<String>,
    fields: Vec<(&'static str, String)>,
}

impl EventVisitor {
    fn record_value(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = Some(value),
            "function" => self.function = Some(value),
            name => self.fields.push((name, value)),
        }
    }
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let raw = format!("{value:?}");
        let unquoted = raw
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .map(str::to_string)
            .unwrap_or(raw);
        self.record_value(field, unquoted);
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_value(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_value(field, value.to_string());
    }
}

impl<S, N> FormatEvent<S, N> for FunctionFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'writer> FormatFields<'writer> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        match visitor.function {
            Some(function) => write!(writer, "{} {function}", metadata.level())?,
            None => {
                let module = metadata.module_path().unwrap_or_else(|| metadata.target());
                write!(writer, "{} {module}", metadata.level())?
            }
        }

        if let Some(scope) = ctx.event_scope() {
            let spans: Vec<&str> = scope.from_root().map(|span| span.name()).collect();
            if !spans.is_empty() {
                write!(writer, " [{}]", spans.join("::"))?;
            }
        }

        write!(writer, ":")?;
        if let Some(message) = visitor.message {
            write!(writer, " {message}")?;
        }
        for (name, value) in visitor.fields {
            write!(writer, " {name}={value}")?;
        }
        writeln!(writer)
    }
}

/// `RUST_LOG` wins when set; otherwise `info`, or `debug` in verbose mode.
fn default_filter(verbose: bool) -> EnvFilter {
    let fallback = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Install the global subscriber. Logs go to stderr so stdout only carries results.
pub fn init_logging(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(default_filter(verbose))
        .with_writer(std::io::stderr)
        .event_format(FunctionFormatter)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tracing::subscriber::DefaultGuard;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct BufferWriter {
        buffer: Arc<Mutex<Vec<u8>>>,
    }

    impl<'a> MakeWriter<'a> for BufferWriter {
        type Writer = BufferWriter;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    impl Write for BufferWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.buffer.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl BufferWriter {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
        }
    }

    fn install_test_subscriber() -> (BufferWriter, DefaultGuard) {
        let writer = BufferWriter::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(writer.clone())
            .with_max_level(tracing::Level::TRACE)
            .event_format(FunctionFormatter)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (writer, guard)
    }

    #[test]
    fn macro_output_names_level_and_function() {
        let (writer, guard) = install_test_subscriber();
        crate::log_info!("scored {} risks", 2);
        drop(guard);

        let output = writer.contents();
        assert!(output.starts_with("INFO "), "output was: {output:?}");
        assert!(
            output.contains("cra_risk::logging::tests::macro_output_names_level_and_function:"),
            "output missing module/function: {output:?}"
        );
        assert!(output.contains("scored 2 risks"), "output missing message: {output:?}");
    }

    #[test]
    fn spans_and_extra_fields_are_rendered() {
        let (writer, guard) = install_test_subscriber();
        {
            let span = tracing::info_span!("assess");
            let _entered = span.enter();
            tracing::warn!(risk_id = "R1", impact = 9, "rating out of range");
        }
        drop(guard);

        let output = writer.contents();
        assert!(output.starts_with("WARN cra_risk::logging::tests"), "{output:?}");
        assert!(output.contains(" [assess]:"), "{output:?}");
        assert!(output.contains("rating out of range risk_id=R1 impact=9"), "{output:?}");
    }
}

#[macro_export]
#[doc(hidden)]
macro_rules! __log_function_path {
    () => {{
        fn __type_name_of<T>(_value: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let name = __type_name_of(|| {});
        match name.find("::{{closure") {
            Some(index) => &name[..index],
            None => name,
        }
    }};
}

#[macro_export]
macro_rules! log_trace {
    ($($arg:tt)*) => {{
        tracing::trace!(function = %$crate::__log_function_path!(), $($arg)*);
    }};
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {{
        tracing::debug!(function = %$crate::__log_function_path!(), $($arg)*);
    }};
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {{
        tracing::info!(function = %$crate::__log_function_path!(), $($arg)*);
    }};
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        tracing::warn!(function = %$crate::__log_function_path!(), $($arg)*);
    }};
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {{
        tracing::error!(function = %$crate::__log_function_path!(), $($arg)*);
    }};
}

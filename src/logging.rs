use {
    anyhow::Result,
    std::{
        fs::File,
        path::Path,
        sync::Arc,
    },
    tracing::Level,
    tracing_subscriber::{
        fmt::{
            layer,
            writer::MakeWriterExt,
        },
        layer::SubscriberExt,
        util::SubscriberInitExt,
    },
};

/// Set up a file writer and a stdout writer, each behind its own level
/// filter. Passing `None` for a level disables that writer.
pub fn setup_logging(
    path: &dyn AsRef<Path>,
    min_level_file: Option<Level>,
    min_level_stdout: Option<Level>,
) -> Result<()> {
    let file_layer = match min_level_file {
        Some(level) => {
            let log_file = Arc::new(File::create(path.as_ref())?);
            Some(
                layer()
                    .with_writer(log_file.with_max_level(level))
                    .with_ansi(false),
            )
        }
        None => None,
    };

    let stdout_layer = min_level_stdout.map(|level| {
        layer()
            .with_writer(std::io::stdout.with_max_level(level))
            .compact()
            .with_line_number(true)
            .with_thread_ids(false)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(())
}

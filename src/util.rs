use {
    anyhow::Result,
    ron::ser::{
        to_string_pretty,
        PrettyConfig,
    },
    serde::Serialize,
    std::{
        fs::File,
        io::Write,
        path::PathBuf,
    },
};

/// Write a RON snapshot of a config next to the run's result files.
pub fn write_config<C: Serialize>(
    config: &C,
    path: PathBuf,
) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(to_string_pretty(config, PrettyConfig::default())?.as_bytes())?;
    Ok(())
}

use {
    anyhow::{
        Context,
        Result,
    },
    std::{
        fs::{
            File,
            OpenOptions,
        },
        io::Write,
        path::Path,
    },
};

/// The append-only CSV results file.
///
/// The file opens with a human-readable hyperparameter block followed by
/// the column header. Creation fails if the file already exists, so prior
/// results are never silently overwritten or merged.
pub struct ResultsLog {
    file: File,
}

impl ResultsLog {
    pub fn create(
        path: &Path,
        hyperparameters: &str,
    ) -> Result<Self> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .with_context(|| format!("refusing to overwrite existing results file {path:?}"))?;

        file.write_all(hyperparameters.as_bytes())?;
        writeln!(file, "avg_reward,time,env_steps,grad_steps,seed")?;
        Ok(Self { file })
    }

    /// Append one evaluation row.
    pub fn append(
        &mut self,
        avg_reward: f64,
        time: f64,
        env_steps: usize,
        grad_steps: usize,
        seed: u64,
    ) -> Result<()> {
        writeln!(self.file, "{avg_reward},{time},{env_steps},{grad_steps},{seed}")?;
        Ok(())
    }
}

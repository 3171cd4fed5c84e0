use std::{
    fs::{self, File},
    io::{self, BufWriter, StdoutLock, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context;
use blockfall_engine::GameConfig;

#[derive(Debug)]
pub enum Output {
    Stdout {
        writer: StdoutLock<'static>,
    },
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl Output {
    pub fn save_json<T>(value: &T, output_path: Option<PathBuf>) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let mut output = Output::from_output_path(output_path)?;
        output.write_json(value)
    }

    pub fn from_output_path(output_path: Option<PathBuf>) -> anyhow::Result<Self> {
        match output_path {
            Some(path) => Output::open(path),
            None => Ok(Output::stdout()),
        }
    }

    pub fn stdout() -> Self {
        Output::Stdout {
            writer: io::stdout().lock(),
        }
    }

    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Output::File {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub fn display_path(&self) -> String {
        match self {
            Output::Stdout { .. } => "stdout".to_string(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }

    pub fn write_json<T>(&mut self, value: &T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        serde_json::to_writer_pretty(&mut *self, value)
            .with_context(|| format!("Failed to write JSON to {}", self.display_path()))?;
        writeln!(&mut *self)
            .with_context(|| format!("Failed to write to {}", self.display_path()))?;
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))
    }

    pub fn write_toml<T>(&mut self, value: &T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let text = toml::to_string_pretty(value).context("Failed to serialize TOML")?;
        self.write_all(text.as_bytes())
            .with_context(|| format!("Failed to write TOML to {}", self.display_path()))?;
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout { writer } => writer.write(buf),
            Output::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout { writer } => writer.flush(),
            Output::File { writer, .. } => writer.flush(),
        }
    }
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let reader = io::BufReader::new(file);
    let value = serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })?;

    Ok(value)
}

/// Builds the session rules from the command line.
///
/// A TOML file only needs the keys it changes; the rest come from the
/// classic or default rule set.
pub fn load_config(path: Option<&Path>, classic: bool) -> anyhow::Result<GameConfig> {
    let base = if classic {
        GameConfig::classic()
    } else {
        GameConfig::default()
    };
    let config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            merge_toml(&base, &text)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        }
        None => base,
    };
    config.validate().context("Invalid configuration")?;
    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}

fn merge_toml(base: &GameConfig, text: &str) -> anyhow::Result<GameConfig> {
    let mut merged: toml::Table = toml::from_str(&toml::to_string(base)?)?;
    let overrides: toml::Table = toml::from_str(text)?;
    merged.extend(overrides);
    Ok(toml::Value::Table(merged).try_into()?)
}

#[cfg(test)]
mod tests {
    use blockfall_engine::{ColorPolicy, GeneratorPolicy, PieceSeed};

    use super::*;

    #[test]
    fn test_merge_keeps_unset_fields() {
        let config =
            merge_toml(&GameConfig::classic(), "rows = 24\nhold_enabled = true\n").unwrap();
        assert_eq!(config.rows, 24);
        assert!(config.hold_enabled);
        assert_eq!(config.generator, GeneratorPolicy::Uniform);
        assert_eq!(config.color, ColorPolicy::PerShape);
        assert_eq!(config.lock_delay_ms, 0);
    }

    #[test]
    fn test_merge_reads_seed_and_policies() {
        let text = r#"
            generator = "uniform"
            color = "per-shape"
            seed = "000102030405060708090a0b0c0d0e0f"
        "#;
        let config = merge_toml(&GameConfig::default(), text).unwrap();
        assert_eq!(config.generator, GeneratorPolicy::Uniform);
        assert_eq!(config.color, ColorPolicy::PerShape);
        assert_eq!(
            config.seed,
            Some(PieceSeed::from_u128(0x0001_0203_0405_0607_0809_0a0b_0c0d_0e0f))
        );
    }

    #[test]
    fn test_merge_rejects_unknown_policy() {
        assert!(merge_toml(&GameConfig::default(), "generator = \"random\"").is_err());
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let text = toml::to_string_pretty(&GameConfig::default()).unwrap();
        let parsed: GameConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, GameConfig::default());
    }
}

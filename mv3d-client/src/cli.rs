//! Command line parsing.

use std::path::PathBuf;

use log::LevelFilter;
use mv3d_core::{
    Error, Result,
    config::{Variant, ViewerConfig},
    mesh::IndexBase,
};

pub const USAGE: &str = "\
Usage: mv3d-client [OPTIONS] [MESH]

Renders MESH (default ./gopher.obj) rotating about its vertical axis.

Options:
  --config <PATH>      Read settings from PATH instead of the user config file
  --variant <NAME>     perspective, flat or constant
  --raw-indices        Use face indices exactly as written (no one-based correction)
  --strict             Fail on the first malformed geometry line
  --log-level <LEVEL>  error, warn, info, debug or trace (default: $MV3D_LOG or info)
  -h, --help           Print this help";

#[derive(Debug, Default, PartialEq)]
pub struct Options {
    pub config: Option<PathBuf>,
    pub mesh: Option<PathBuf>,
    pub variant: Option<Variant>,
    pub raw_indices: bool,
    pub strict: bool,
    pub log_level: Option<LevelFilter>,
    pub help: bool,
}

impl Options {
    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut options = Self::default();
        let mut args = args.into_iter().map(Into::into);

        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .ok_or_else(|| Error::Usage(format!("{flag} needs a value")))
            };

            match arg.as_str() {
                "-h" | "--help" => options.help = true,
                "--config" => options.config = Some(PathBuf::from(value("--config")?)),
                "--variant" => options.variant = Some(value("--variant")?.parse()?),
                "--raw-indices" => options.raw_indices = true,
                "--strict" => options.strict = true,
                "--log-level" => {
                    let level = value("--log-level")?;
                    let parsed = level
                        .parse::<LevelFilter>()
                        .map_err(|_| Error::Usage(format!("unknown log level '{level}'")))?;
                    options.log_level = Some(parsed);
                }
                flag if flag.starts_with('-') => {
                    return Err(Error::Usage(format!("unknown option '{flag}'")));
                }
                path if options.mesh.is_none() => options.mesh = Some(PathBuf::from(path)),
                extra => return Err(Error::Usage(format!("unexpected argument '{extra}'"))),
            }
        }

        Ok(options)
    }

    /// Applies command line overrides on top of a loaded configuration.
    pub fn apply(&self, config: &mut ViewerConfig) {
        if let Some(mesh) = &self.mesh {
            config.mesh.path = mesh.clone();
        }
        if let Some(variant) = self.variant {
            config.render.apply(variant);
        }
        if self.raw_indices {
            config.mesh.index_base = IndexBase::Raw;
        }
        if self.strict {
            config.mesh.strict = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mv3d_core::config::Topology;

    #[test]
    fn parses_flags_and_mesh_path() {
        let options = Options::parse([
            "--variant",
            "flat",
            "--raw-indices",
            "models/teapot.obj",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(options.mesh, Some(PathBuf::from("models/teapot.obj")));
        assert_eq!(options.variant, Some(Variant::Flat));
        assert!(options.raw_indices);
        assert!(!options.strict);
        assert_eq!(options.log_level, Some(LevelFilter::Debug));
    }

    #[test]
    fn overrides_apply_to_config() {
        let options = Options::parse(["--variant", "constant", "--strict", "a.obj"]).unwrap();
        let mut config = ViewerConfig::default();
        options.apply(&mut config);
        assert_eq!(config.mesh.path, PathBuf::from("a.obj"));
        assert!(config.mesh.strict);
        assert_eq!(config.mesh.index_base, IndexBase::OneBased);
        assert_eq!(config.render.topology, Topology::TriangleFan);
        assert!(!config.render.camera_uniforms);
    }

    #[test]
    fn bad_arguments_are_usage_errors() {
        for args in [
            vec!["--config"],
            vec!["--bogus"],
            vec!["a.obj", "b.obj"],
            vec!["--log-level", "loud"],
            vec!["--variant", "wireframe"],
        ] {
            assert!(
                matches!(Options::parse(args.clone()), Err(Error::Usage(_))),
                "{args:?}"
            );
        }
    }
}

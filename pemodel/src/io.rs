use clap::Args;
use pem_core::models::{ParamError, ParamSource, Params};
use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write, stdin, stdout},
    path::PathBuf,
    str::FromStr,
};

// Every subcommand reads a parameter file and writes a JSON report.
// This struct standardizes their implementation.
#[derive(Args, Debug)]
pub struct IOArgs {
    /// The model parameter JSON file ("-" implies stdin)
    #[arg(value_parser = clap::value_parser!(PathOrStd))]
    input: PathOrStd,

    /// The output file ("-" implies stdout)
    #[arg(short, long, default_value = "-", value_parser = clap::value_parser!(PathOrStd))]
    output: PathOrStd,
}

impl IOArgs {
    pub fn read(&self) -> io::Result<Box<dyn Read>> {
        match &self.input {
            PathOrStd::Path(path) => Ok(Box::new(BufReader::new(File::open(path)?))),
            PathOrStd::Std => Ok(Box::new(stdin().lock())),
        }
    }

    pub fn write(&self) -> io::Result<Box<dyn Write>> {
        match &self.output {
            PathOrStd::Path(path) => Ok(Box::new(BufWriter::new(File::create(path)?))),
            PathOrStd::Std => Ok(Box::new(stdout().lock())),
        }
    }

    /// Read the model parameters, reverting to the defaults if the input cannot be opened,
    /// parsed or validated
    pub fn params(&self) -> (Params, ParamSource) {
        let params = self
            .read()
            .map_err(ParamError::from)
            .and_then(Params::from_reader);
        Params::or_default(params)
    }

    /// Pretty-print a report to the output
    pub fn emit<T: serde::Serialize>(&self, report: &T) -> anyhow::Result<()> {
        let mut output = self.write()?;
        serde_json::to_writer_pretty(&mut output, report)?;
        writeln!(output)?;
        output.flush()?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PathOrStd {
    Path(PathBuf),
    Std,
}

impl FromStr for PathOrStd {
    type Err = <PathBuf as FromStr>::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "-" {
            Ok(Self::Std)
        } else {
            Ok(Self::Path(s.parse()?))
        }
    }
}

use crate::{
    error::Error,
    layout::LayoutResult,
    parser::parse_file,
    resolve::extract_structs,
    sizing::SizingModel,
};
use log::debug;
use rayon::prelude::*;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Options {
    pub sizing: SizingModel,
}

/// Runs the whole pipeline over one piece of Go source: parse, resolve every
/// struct's field types, then lay each struct out as declared and reordered.
#[derive(Clone, Debug, Default)]
pub struct Analyzer {
    options: Options,
}

impl Analyzer {
    pub fn new(options: Options) -> Self {
        Analyzer { options }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// One result per struct type, in the order the structs appear in the
    /// source. Fails as a whole if any type cannot be resolved.
    pub fn analyze(&self, source: &str) -> Result<Vec<LayoutResult>, Error> {
        let file = parse_file(source)?;

        debug!(
            "parsed {} type and {} constant declarations",
            file.types.len(),
            file.consts.len()
        );

        let structs = extract_structs(&file, self.options.sizing)?;

        let results = structs
            .par_iter()
            .map(|s| LayoutResult::new(s.name.as_str(), &s.fields))
            .collect::<Result<Vec<_>, _>>()?;

        for result in &results {
            debug!(
                "{}: {} bytes as declared, {} bytes reordered",
                result.name(),
                result.total_size(),
                result.optimized_total_size()
            );
        }

        Ok(results)
    }
}

/// Analyzes `source` for a 64-bit target.
pub fn analyze_structs(source: &str) -> Result<Vec<LayoutResult>, Error> {
    Analyzer::default().analyze(source)
}

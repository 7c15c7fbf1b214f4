use std::io::BufWriter;
use std::io::Write;
use std::path::Path;

use crate::AnyEmptyResult;
use crate::Emitter;
use crate::Section;
use crate::SectionId;
use crate::SnipgenError;
use crate::SnipgenResult;

/// Generate a whole file from scratch through a [`Section`].
///
/// `build` receives a fresh section and its root handle; on success the
/// rendered output replaces the file at `fpath` by an atomic rename of a
/// temporary file created in the same directory. If `build` fails, or any
/// write fails, the temporary file is removed and whatever is at `fpath` is
/// left untouched.
///
/// This is the code path for generators that own an entire output file and
/// never go through the snippet scanner.
pub fn write_file<F>(fpath: &Path, indent_by: &str, build: F) -> SnipgenResult<()>
where
	F: FnOnce(&mut Section, SectionId) -> AnyEmptyResult,
{
	let mut section = Section::new();
	let root = section.root();
	build(&mut section, root).map_err(|err| SnipgenError::GeneratorFailed {
		file: fpath.display().to_string(),
		reason: err.to_string(),
	})?;

	let dir = match fpath.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent,
		_ => Path::new("."),
	};
	let tmp = tempfile::Builder::new()
		.prefix(".snipgen-")
		.suffix(".tmp")
		.tempfile_in(dir)?;
	let mut out = BufWriter::new(tmp);

	let emitter = Emitter::new("", indent_by);
	emitter.render(&section, &mut out)?;
	out.flush()?;

	let tmp = out
		.into_inner()
		.map_err(std::io::IntoInnerError::into_error)?;
	tmp
		.persist(fpath)
		.map_err(|err| SnipgenError::Io(err.error))?;
	Ok(())
}

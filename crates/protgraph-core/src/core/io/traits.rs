use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Defines the interface for reading and writing interaction-graph file formats.
///
/// Implementors handle format-specific parsing and serialization; the path-based
/// methods only add file handling around them.
pub trait GraphFile {
    /// The graph type stored by the format.
    type Graph;

    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads a graph from a buffered reader.
    ///
    /// # Arguments
    ///
    /// * `reader` - The buffered reader to read from.
    ///
    /// # Return
    ///
    /// Returns the parsed graph, metadata included.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or I/O operations encounter issues.
    fn read_from(reader: &mut impl BufRead) -> Result<Self::Graph, Self::Error>;

    /// Writes a graph to a writer.
    ///
    /// # Arguments
    ///
    /// * `graph` - The graph to write.
    /// * `writer` - The writer to output to.
    ///
    /// # Return
    ///
    /// Returns `Ok(())` on success.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_to(graph: &Self::Graph, writer: &mut impl Write) -> Result<(), Self::Error>;

    /// Reads a graph from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self::Graph, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    /// Writes a graph to a file path, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    fn write_to_path<P: AsRef<Path>>(graph: &Self::Graph, path: P) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(graph, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

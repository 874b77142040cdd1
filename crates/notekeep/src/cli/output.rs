//! Status and listing output for the archive commands.

use std::fmt::Display;
use std::io::{self, Write};

use crate::archive::Listing;

/// Writes command output, dropping status lines when quiet.
///
/// Requested data (`list`, `download --stdout`, `config show`) goes through
/// [`Reporter::data`] and is never suppressed.
#[derive(Debug)]
pub struct Reporter<W> {
    out: W,
    quiet: bool,
}

impl Reporter<io::Stdout> {
    /// Reporter writing to stdout.
    #[must_use]
    pub fn stdout(quiet: bool) -> Self {
        Self::new(io::stdout(), quiet)
    }
}

impl<W: Write> Reporter<W> {
    /// Reporter writing to `out`.
    pub fn new(out: W, quiet: bool) -> Self {
        Self { out, quiet }
    }

    /// Print a status line, unless quiet.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn status(&mut self, message: impl Display) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        writeln!(self.out, "{message}")
    }

    /// Print the listing refreshed after a save or delete, unless quiet.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn refreshed(&mut self, listing: &Listing) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        writeln!(self.out)?;
        self.listing(listing)
    }

    /// Print a listing the user asked for.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn listing(&mut self, listing: &Listing) -> io::Result<()> {
        match listing {
            Listing::Empty => writeln!(self.out, "No notes found."),
            Listing::Notes(notes) => {
                for note in notes {
                    writeln!(self.out, "{}  {}", note.display_date(), note.title)?;
                    writeln!(self.out, "    {}", note.name)?;
                }
                Ok(())
            }
        }
    }

    /// Print requested data as is.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn data(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.out.write_all(bytes)?;
        self.out.flush()
    }
}

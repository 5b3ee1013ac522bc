use super::path::OutputPath;
use super::{FtleMetadata, FtleOutput, FtleSink};
use crate::errors::*;
use crate::input::{write_to_file, FileFormat};
use log::debug;
use ndarray::ArrayView1;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};

/// Message type for the IO worker thread channel.
pub enum IOWorkerMsg {
    Quit,
    Ftle(FtleOutput),
}

/// Writes FTLE artifacts on a separate thread, so that the window workers do
/// not wait for the disk. At most `io_queue_size` artifacts are queued.
pub struct Worker {
    tx: Mutex<SyncSender<IOWorkerMsg>>,
    io_worker: JoinHandle<Result<()>>,
}

impl Worker {
    pub fn new(
        io_queue_size: usize,
        output_path: &OutputPath,
        output_format: FileFormat,
    ) -> Result<Worker> {
        output_path
            .create()
            .chain_err(|| "Cannot prepare output directory.")?;

        // Create communication channel for thread
        let (tx, rx) = mpsc::sync_channel::<IOWorkerMsg>(io_queue_size);

        // clone, so it can be moved into thread closure
        let op = output_path.clone();

        let io_worker = thread::spawn(move || dispatch(&rx, output_format, &op));

        Ok(Worker {
            tx: Mutex::new(tx),
            io_worker,
        })
    }

    pub fn append(&self, output: FtleOutput) -> Result<()> {
        let tx = match self.tx.lock() {
            Ok(tx) => tx.clone(),
            Err(_) => bail!("Output channel is poisoned."),
        };

        tx.send(IOWorkerMsg::Ftle(output))
            .chain_err(|| "Cannot append data to output queue, IO worker stopped.")
    }

    /// Waits until all queued artifacts are written and stops the thread.
    /// Returns the first error the IO worker ran into.
    pub fn quit(self) -> Result<()> {
        let tx = match self.tx.into_inner() {
            Ok(tx) => tx,
            Err(poisoned) => poisoned.into_inner(),
        };

        // a failed send means the worker already ended, its result follows
        let _ = tx.send(IOWorkerMsg::Quit);

        match self.io_worker.join() {
            Ok(v) => v,
            Err(_) => bail!("Cannot join IO worker thread."),
        }
    }
}

impl FtleSink for Worker {
    fn write_ftle(
        &self,
        window_index: usize,
        ftle: ArrayView1<f64>,
        metadata: &FtleMetadata,
    ) -> Result<()> {
        debug!("FTLE of window {} was appended to the output queue.", window_index);
        self.append(FtleOutput::new(window_index, ftle, metadata))
    }
}

fn dispatch(rx: &Receiver<IOWorkerMsg>, format: FileFormat, path: &OutputPath) -> Result<()> {
    // ends when all senders are gone as well
    while let Ok(msg) = rx.recv() {
        match msg {
            IOWorkerMsg::Quit => break,

            IOWorkerMsg::Ftle(v) => {
                let filepath = path.artifact(v.window_index, format);
                debug!("Writing {}.", filepath.display());

                write_to_file(&v, &filepath).chain_err(|| {
                    format!("Cannot write FTLE of window {}.", v.window_index)
                })?;
            }
        }
    }

    debug!("Output queue closed.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::read_from_file;
    use ndarray::arr1;
    use std::path::Path;
    use tempfile::tempdir;

    fn metadata() -> FtleMetadata {
        FtleMetadata {
            integrator: "euler".to_string(),
            interpolator: "cubic".to_string(),
            timestep: 1.,
            map_period: 2.,
            first_snapshot: "v0.cbor".to_string(),
            last_snapshot: "v2.cbor".to_string(),
            coordinate_x: vec![0.5, 1.5],
            coordinate_y: vec![0.5, 0.5],
        }
    }

    #[test]
    fn writes_one_file_per_window() {
        let dir = tempdir().unwrap();

        for &format in &[FileFormat::CBOR, FileFormat::Bincode] {
            let path = OutputPath::new(dir.path(), format.extension());
            let worker = Worker::new(1, &path, format).unwrap();

            for i in 0..3 {
                let ftle = arr1(&[i as f64, f64::NAN]);
                worker.write_ftle(i, ftle.view(), &metadata()).unwrap();
            }
            worker.quit().unwrap();

            for i in 0..3 {
                let out: FtleOutput = read_from_file(&path.artifact(i, format)).unwrap();
                assert_eq!(out.window_index, i);
                assert_eq!(out.ftle[0], i as f64);
                assert!(out.ftle[1].is_nan());
                assert_eq!(out.metadata, metadata());
            }
        }
    }

    #[test]
    fn reports_write_failures() {
        let dir = tempdir().unwrap();
        let path = OutputPath::new(dir.path(), "run");
        let worker = Worker::new(1, &path, FileFormat::CBOR).unwrap();

        // occupy the artifact name with a directory
        std::fs::create_dir(path.artifact(0, FileFormat::CBOR)).unwrap();
        let _ = worker.write_ftle(0, arr1(&[1.]).view(), &metadata());

        assert!(worker.quit().is_err());
        assert!(!Path::new(&path.artifact(1, FileFormat::CBOR)).exists());
    }
}

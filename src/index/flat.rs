// Exhaustive (flat) index stored in the FAISS binary layout
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::info;

use super::{Metric, Neighbor, VectorIndex, MISSING_ID};
use crate::errors::{RagError, Result};

const FOURCC_FLAT_IP: &[u8; 4] = b"IxFI";
const FOURCC_FLAT_L2: &[u8; 4] = b"IxF2";
const FOURCC_FLAT: &[u8; 4] = b"IxFl";

const METRIC_INNER_PRODUCT: i32 = 0;
const METRIC_L2: i32 = 1;

/// Placeholder written twice in every FAISS index header
const HEADER_DUMMY: i64 = 1 << 20;

/// Flat index holding every vector contiguously
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: usize,
    metric: Metric,
    vectors: Vec<f32>,
}

impl FlatIndex {
    /// Build from row-major vectors (`vectors.len()` must be a multiple of `dimension`)
    pub fn from_vectors(dimension: usize, metric: Metric, vectors: Vec<f32>) -> Result<Self> {
        if dimension == 0 {
            return Err(RagError::IndexFormat("dimension must be positive".to_string()));
        }
        if vectors.len() % dimension != 0 {
            return Err(RagError::IndexFormat(format!(
                "{} values do not divide into vectors of dimension {}",
                vectors.len(),
                dimension
            )));
        }
        Ok(Self {
            dimension,
            metric,
            vectors,
        })
    }

    /// Read an index file written by FAISS (`write_index` on an `IndexFlat*`)
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let index = Self::read_from(&mut BufReader::new(file))?;
        info!(
            path = %path.display(),
            vectors = index.len(),
            dimension = index.dimension,
            metric = ?index.metric,
            "Loaded vector index"
        );
        Ok(index)
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut fourcc = [0u8; 4];
        reader.read_exact(&mut fourcc)?;
        if &fourcc != FOURCC_FLAT_IP && &fourcc != FOURCC_FLAT_L2 && &fourcc != FOURCC_FLAT {
            return Err(RagError::IndexFormat(format!(
                "unsupported index type {:?}, expected a flat index",
                String::from_utf8_lossy(&fourcc)
            )));
        }

        let d = read_i32(reader)?;
        let ntotal = read_i64(reader)?;
        let _dummy = read_i64(reader)?;
        let _dummy = read_i64(reader)?;
        let _is_trained = read_u8(reader)?;
        let metric_type = read_i32(reader)?;
        if metric_type > 1 {
            let _metric_arg = read_f32(reader)?;
        }

        let metric = match metric_type {
            METRIC_INNER_PRODUCT => Metric::InnerProduct,
            METRIC_L2 => Metric::L2,
            other => {
                return Err(RagError::IndexFormat(format!(
                    "unsupported metric type {}",
                    other
                )))
            }
        };

        if d <= 0 || ntotal < 0 {
            return Err(RagError::IndexFormat(format!(
                "invalid header: d={} ntotal={}",
                d, ntotal
            )));
        }
        let dimension = d as usize;
        let expected = (ntotal as usize)
            .checked_mul(dimension)
            .ok_or_else(|| RagError::IndexFormat("vector count overflows".to_string()))?;

        let count = read_u64(reader)? as usize;
        if count != expected {
            return Err(RagError::IndexFormat(format!(
                "header declares {} vectors of dimension {} but payload holds {} values",
                ntotal, dimension, count
            )));
        }

        let mut bytes = vec![0u8; count * 4];
        reader.read_exact(&mut bytes)?;
        let vectors = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        Self::from_vectors(dimension, metric, vectors)
    }

    /// Write the index in the same layout `read_from` accepts
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let (fourcc, metric_type) = match self.metric {
            Metric::InnerProduct => (FOURCC_FLAT_IP, METRIC_INNER_PRODUCT),
            Metric::L2 => (FOURCC_FLAT_L2, METRIC_L2),
        };
        writer.write_all(fourcc)?;
        writer.write_all(&(self.dimension as i32).to_le_bytes())?;
        writer.write_all(&(self.len() as i64).to_le_bytes())?;
        writer.write_all(&HEADER_DUMMY.to_le_bytes())?;
        writer.write_all(&HEADER_DUMMY.to_le_bytes())?;
        writer.write_all(&[1u8])?;
        writer.write_all(&metric_type.to_le_bytes())?;
        writer.write_all(&(self.vectors.len() as u64).to_le_bytes())?;
        for value in &self.vectors {
            writer.write_all(&value.to_le_bytes())?;
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    fn score(&self, query: &[f32], row: &[f32]) -> f32 {
        match self.metric {
            Metric::InnerProduct => query.iter().zip(row).map(|(a, b)| a * b).sum(),
            Metric::L2 => query
                .iter()
                .zip(row)
                .map(|(a, b)| (a - b) * (a - b))
                .sum(),
        }
    }
}

impl VectorIndex for FlatIndex {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.vectors.len() / self.dimension
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dimension {
            return Err(RagError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut hits: Vec<Neighbor> = self
            .vectors
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(id, row)| Neighbor {
                id: id as i64,
                distance: self.score(query, row),
            })
            .collect();

        // Stable sort keeps lower ids first on ties
        match self.metric {
            Metric::InnerProduct => hits.sort_by(|a, b| b.distance.total_cmp(&a.distance)),
            Metric::L2 => hits.sort_by(|a, b| a.distance.total_cmp(&b.distance)),
        }
        hits.truncate(k);

        let worst = self.metric.worst_score();
        hits.resize(
            k,
            Neighbor {
                id: MISSING_ID,
                distance: worst,
            },
        );
        Ok(hits)
    }
}

fn read_u8<R: Read>(reader: &mut R) -> Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn read_i32<R: Read>(reader: &mut R) -> Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_f32<R: Read>(reader: &mut R) -> Result<f32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
}

fn read_i64<R: Read>(reader: &mut R) -> Result<i64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(i64::from_le_bytes(buf))
}

fn read_u64<R: Read>(reader: &mut R) -> Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

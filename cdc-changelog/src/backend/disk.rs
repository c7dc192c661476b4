use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use dashmap::DashMap;
use memmap2::Mmap;
use serde::{Deserialize, Serialize};

use cdc_common::err::{CResult, ReError};

use super::ChangeLog;

const HEAD_META_FILE: &str = "head.meta";
const FRAME_HEADER_LEN: u64 = 8;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct HeadMarker {
    segment_id: u64,
    offset: u64,
}

#[derive(Debug, Clone)]
struct EntryRef {
    segment_id: u64,
    offset: u64,
    len: u32,
}

struct SegmentMeta {
    id: u64,
    path: PathBuf,
    len: u64,
}

struct TableLog {
    dir: PathBuf,
    segment_size: u64,
    segments: VecDeque<SegmentMeta>,
    entries: VecDeque<EntryRef>,
    writer: File,
}

/// On-disk change-log backend: per-table segment files under a configured
/// directory, `memmap2`-backed reads, `bincode`-framed entries
/// (`[u32 length][u32 crc32][payload]`), crc-checked with `crc32fast`.
/// A sidecar `head.meta` file records the oldest live entry's
/// (segment, offset) so `trimHead` survives a restart without needing to
/// physically rewrite already-written segments.
pub struct DiskChangeLog {
    root: PathBuf,
    segment_size: u64,
    tables: DashMap<String, Mutex<TableLog>>,
}

impl DiskChangeLog {
    pub fn open(root: impl Into<PathBuf>, segment_size: u64) -> CResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(ReError::from)?;
        Ok(DiskChangeLog {
            root,
            segment_size,
            tables: DashMap::new(),
        })
    }

    fn with_table<R>(&self, table: &str, f: impl FnOnce(&mut TableLog) -> CResult<R>) -> CResult<R> {
        if self.tables.get(table).is_none() {
            let opened = TableLog::open(&self.root, table, self.segment_size)?;
            self.tables
                .entry(table.to_string())
                .or_insert_with(|| Mutex::new(opened));
        }
        let entry = self.tables.get(table).expect("just inserted or already present");
        let mut guard = entry
            .lock()
            .map_err(|e| ReError::StoreUnavailable(format!("change-log lock poisoned: {}", e)))?;
        f(&mut guard)
    }
}

impl ChangeLog for DiskChangeLog {
    fn append(&self, table: &str, bytes: Vec<u8>) -> CResult<()> {
        self.with_table(table, |log| log.append(bytes))
    }

    fn range_read(&self, table: &str, start: i64, end: i64) -> CResult<Vec<Vec<u8>>> {
        self.with_table(table, |log| log.range_read(start, end))
    }

    fn size(&self, table: &str) -> CResult<usize> {
        self.with_table(table, |log| Ok(log.entries.len()))
    }

    fn trim_head(&self, table: &str, n: usize) -> CResult<()> {
        self.with_table(table, |log| log.trim_head(n))
    }

    fn truncate(&self, table: &str) -> CResult<()> {
        self.with_table(table, |log| log.truncate())
    }
}

fn segment_path(dir: &Path, id: u64) -> PathBuf {
    dir.join(format!("{:020}.seg", id))
}

fn head_meta_path(dir: &Path) -> PathBuf {
    dir.join(HEAD_META_FILE)
}

fn read_head_marker(dir: &Path) -> CResult<Option<HeadMarker>> {
    let path = head_meta_path(dir);
    if !path.exists() {
        return Ok(None);
    }
    let bytes = fs::read(&path).map_err(ReError::from)?;
    bincode::deserialize(&bytes)
        .map(Some)
        .map_err(|e| ReError::StoreUnavailable(format!("corrupt head marker: {}", e)))
}

fn write_head_marker(dir: &Path, marker: HeadMarker) -> CResult<()> {
    let bytes = bincode::serialize(&marker)
        .map_err(|e| ReError::StoreUnavailable(format!("failed to encode head marker: {}", e)))?;
    let tmp_path = dir.join(format!("{}.tmp", HEAD_META_FILE));
    let mut tmp = File::create(&tmp_path).map_err(ReError::from)?;
    tmp.write_all(&bytes).map_err(ReError::from)?;
    tmp.sync_all().map_err(ReError::from)?;
    fs::rename(&tmp_path, head_meta_path(dir)).map_err(ReError::from)?;
    Ok(())
}

fn existing_segment_ids(dir: &Path) -> CResult<Vec<u64>> {
    let mut ids = Vec::new();
    for entry in fs::read_dir(dir).map_err(ReError::from)? {
        let entry = entry.map_err(ReError::from)?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if let Some(stem) = name.strip_suffix(".seg") {
            if let Ok(id) = stem.parse::<u64>() {
                ids.push(id);
            }
        }
    }
    ids.sort_unstable();
    Ok(ids)
}

/// Parses frames out of `bytes` starting at `start_offset`. Stops (without
/// error) at the first frame whose header or payload is incomplete or whose
/// crc does not match — that is the allowed "corruption of the tail
/// truncates on restart" behavior. Returns the parsed entries plus the
/// offset one past the last valid frame (the new logical end of the file).
fn parse_frames(
    segment_id: u64,
    bytes: &[u8],
    start_offset: u64,
) -> (Vec<EntryRef>, u64) {
    let mut entries = Vec::new();
    let mut offset = start_offset;
    loop {
        let header_end = offset + FRAME_HEADER_LEN;
        if header_end > bytes.len() as u64 {
            break;
        }
        let mut cursor = Cursor::new(&bytes[offset as usize..header_end as usize]);
        let len = match cursor.read_u32::<LittleEndian>() {
            Ok(v) => v,
            Err(_) => break,
        };
        let crc = match cursor.read_u32::<LittleEndian>() {
            Ok(v) => v,
            Err(_) => break,
        };
        let payload_start = header_end;
        let payload_end = payload_start + len as u64;
        if payload_end > bytes.len() as u64 {
            break;
        }
        let payload = &bytes[payload_start as usize..payload_end as usize];
        if crc32fast::hash(payload) != crc {
            break;
        }
        entries.push(EntryRef {
            segment_id,
            offset,
            len,
        });
        offset = payload_end;
    }
    (entries, offset)
}

impl TableLog {
    fn open(root: &Path, table: &str, segment_size: u64) -> CResult<Self> {
        let dir = root.join(table);
        fs::create_dir_all(&dir).map_err(ReError::from)?;

        let ids = existing_segment_ids(&dir)?;
        if ids.is_empty() {
            let path = segment_path(&dir, 0);
            File::create(&path).map_err(ReError::from)?;
            write_head_marker(&dir, HeadMarker { segment_id: 0, offset: 0 })?;
            let writer = OpenOptions::new().append(true).open(&path).map_err(ReError::from)?;
            return Ok(TableLog {
                dir,
                segment_size,
                segments: VecDeque::from([SegmentMeta { id: 0, path, len: 0 }]),
                entries: VecDeque::new(),
                writer,
            });
        }

        let head = read_head_marker(&dir)?.unwrap_or(HeadMarker {
            segment_id: ids[0],
            offset: 0,
        });

        let mut segments = VecDeque::new();
        let mut entries = VecDeque::new();
        let last_id = *ids.last().unwrap();
        for id in &ids {
            let id = *id;
            if id < head.segment_id {
                continue;
            }
            let path = segment_path(&dir, id);
            let file_len = fs::metadata(&path).map_err(ReError::from)?.len();
            let start_offset = if id == head.segment_id { head.offset } else { 0 };
            let (parsed, valid_len) = if file_len == 0 {
                (Vec::new(), 0)
            } else {
                let file = File::open(&path).map_err(ReError::from)?;
                let mmap = unsafe { Mmap::map(&file).map_err(ReError::from)? };
                parse_frames(id, &mmap, start_offset)
            };
            // A truncated tail on the last segment is corruption recovery,
            // not an error: physically truncate the file to the last valid
            // frame boundary so a subsequent append doesn't leave a gap.
            if id == last_id && valid_len < file_len {
                tracing::warn!(
                    table,
                    segment = id,
                    valid_len,
                    file_len,
                    "truncating corrupt tail of change-log segment on open"
                );
                let file = OpenOptions::new().write(true).open(&path).map_err(ReError::from)?;
                file.set_len(valid_len).map_err(ReError::from)?;
            }
            entries.extend(parsed);
            segments.push_back(SegmentMeta {
                id,
                path,
                len: valid_len,
            });
        }

        if segments.is_empty() {
            let path = segment_path(&dir, last_id + 1);
            File::create(&path).map_err(ReError::from)?;
            segments.push_back(SegmentMeta {
                id: last_id + 1,
                path,
                len: 0,
            });
        }

        let active_path = segments.back().unwrap().path.clone();
        let writer = OpenOptions::new()
            .append(true)
            .open(&active_path)
            .map_err(ReError::from)?;

        Ok(TableLog {
            dir,
            segment_size,
            segments,
            entries,
            writer,
        })
    }

    fn append(&mut self, bytes: Vec<u8>) -> CResult<()> {
        let crc = crc32fast::hash(&bytes);
        let mut frame = Vec::with_capacity(bytes.len() + FRAME_HEADER_LEN as usize);
        frame.write_u32::<LittleEndian>(bytes.len() as u32).map_err(ReError::from)?;
        frame.write_u32::<LittleEndian>(crc).map_err(ReError::from)?;
        frame.extend_from_slice(&bytes);

        self.writer.write_all(&frame).map_err(ReError::from)?;
        self.writer.sync_all().map_err(ReError::from)?;

        let current = self.segments.back_mut().expect("at least one segment always present");
        let offset = current.len;
        current.len += frame.len() as u64;
        let (segment_id, rolled_over) = (current.id, current.len >= self.segment_size);

        self.entries.push_back(EntryRef {
            segment_id,
            offset,
            len: bytes.len() as u32,
        });

        if rolled_over {
            let new_id = segment_id + 1;
            let path = segment_path(&self.dir, new_id);
            File::create(&path).map_err(ReError::from)?;
            self.writer = OpenOptions::new().append(true).open(&path).map_err(ReError::from)?;
            self.segments.push_back(SegmentMeta { id: new_id, path, len: 0 });
        }
        Ok(())
    }

    fn read_entry(&self, entry: &EntryRef) -> CResult<Vec<u8>> {
        let segment = self
            .segments
            .iter()
            .find(|s| s.id == entry.segment_id)
            .ok_or_else(|| ReError::StoreUnavailable(format!("segment {} missing", entry.segment_id)))?;
        let file = File::open(&segment.path).map_err(ReError::from)?;
        let mmap = unsafe { Mmap::map(&file).map_err(ReError::from)? };
        let payload_start = entry.offset as usize + FRAME_HEADER_LEN as usize;
        let payload_end = payload_start + entry.len as usize;
        Ok(mmap[payload_start..payload_end].to_vec())
    }

    fn range_read(&self, start: i64, end: i64) -> CResult<Vec<Vec<u8>>> {
        let len = self.entries.len();
        if len == 0 {
            return Ok(Vec::new());
        }
        let start = start.max(0) as usize;
        if start >= len {
            return Ok(Vec::new());
        }
        let end = if end < 0 { len - 1 } else { (end as usize).min(len - 1) };
        if start > end {
            return Ok(Vec::new());
        }
        self.entries
            .iter()
            .skip(start)
            .take(end - start + 1)
            .map(|e| self.read_entry(e))
            .collect()
    }

    fn trim_head(&mut self, n: usize) -> CResult<()> {
        let n = n.min(self.entries.len());
        for _ in 0..n {
            self.entries.pop_front();
        }
        let new_marker = match self.entries.front() {
            Some(front) => HeadMarker {
                segment_id: front.segment_id,
                offset: front.offset,
            },
            None => {
                let active = self.segments.back().expect("at least one segment always present");
                HeadMarker {
                    segment_id: active.id,
                    offset: active.len,
                }
            }
        };
        write_head_marker(&self.dir, new_marker)?;

        while self
            .segments
            .front()
            .map(|s| s.id < new_marker.segment_id)
            .unwrap_or(false)
        {
            let stale = self.segments.pop_front().unwrap();
            let _ = fs::remove_file(&stale.path);
        }
        Ok(())
    }

    fn truncate(&mut self) -> CResult<()> {
        for segment in self.segments.drain(..) {
            let _ = fs::remove_file(&segment.path);
        }
        self.entries.clear();
        let path = segment_path(&self.dir, 0);
        File::create(&path).map_err(ReError::from)?;
        self.segments.push_back(SegmentMeta { id: 0, path: path.clone(), len: 0 });
        self.writer = OpenOptions::new().append(true).open(&path).map_err(ReError::from)?;
        write_head_marker(&self.dir, HeadMarker { segment_id: 0, offset: 0 })?;
        Ok(())
    }
}

//! Bundling of a collection into a single uncompressed zip archive.
//!
//! The archive is streamed straight from iRODS into an upload, so its size must be known before
//! the first byte is read: the upload announces it as its length. [`Plan`] fixes the layout of
//! the archive (member order, which zip64 fields each member carries) and its exact size up
//! front, and [`Encoder`] then produces exactly that layout as the file contents come in.
//!
//! Members are stored (not compressed), always carry a zip64 extra field in their local header,
//! and are followed by a zip64 data descriptor, because their CRC is only known once their
//! contents have been streamed. Further zip64 fields are used only once the archive grows past
//! [`ZIP64_LIMIT`] or holds more than [`ZIP64_ENTRY_LIMIT`] members.

use crate::irods::{DataObject, Irods, BLOCK_SIZE};
use anyhow::Error;
use async_std::{
    channel::Sender,
    fs::File,
    io::{self, WriteExt},
};
use chrono::{Datelike, Local, NaiveDateTime, Timelike};
use md5::Md5;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

/// Sizes and offsets from this limit on require zip64 fields.
pub const ZIP64_LIMIT: u64 = (1 << 31) - 1;

/// Archives with more members than this require zip64 end records.
pub const ZIP64_ENTRY_LIMIT: usize = u16::MAX as usize;

const LOCAL_HEADER: u64 = 30;
const LOCAL_ZIP64_EXTRA: u64 = 20;
const DATA_DESCRIPTOR: u64 = 24;
const CENTRAL_HEADER: u64 = 46;
const END_OF_CENTRAL_DIRECTORY: u64 = 22;
const ZIP64_END_OF_CENTRAL_DIRECTORY: u64 = 56;
const ZIP64_END_LOCATOR: u64 = 20;

const VERSION: u16 = 45;
/// Sizes in data descriptor, UTF-8 names.
const FLAGS: u16 = 0x0808;
const ZIP64_EXTRA_TAG: u16 = 0x0001;

/// Select the objects of `collection` to bundle.
///
/// `restrict_list` is a comma-separated list of paths relative to the collection. If it is empty,
/// every object is selected.
pub fn select(collection: &str, objects: Vec<DataObject>, restrict_list: &str) -> Vec<DataObject> {
    let selected = restrict_list
        .split(',')
        .map(|path| path.trim().trim_start_matches('/'))
        .filter(|path| !path.is_empty())
        .collect::<Vec<_>>();
    if selected.is_empty() {
        return objects;
    }
    objects
        .into_iter()
        .filter(|obj| selected.contains(&obj.relative_path(collection)))
        .collect()
}

/// A member of a planned archive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    pub object: DataObject,
    /// Name of the member in the archive.
    pub name: String,
    /// Whether the size of the member needs zip64 fields.
    large: bool,
    /// Whether the offset of the member is recorded in a zip64 field.
    zip64_offset: bool,
}

/// The layout of an archive.
#[derive(Clone, Debug)]
pub struct Plan {
    members: Vec<Member>,
    size: u64,
    zip64: bool,
}

impl Plan {
    /// Lay out an archive of `objects`, naming each member by its path relative to `collection`.
    ///
    /// Members are ordered from largest to smallest.
    pub fn new(collection: &str, objects: Vec<DataObject>) -> Self {
        Self::with_limits(collection, objects, ZIP64_LIMIT, ZIP64_ENTRY_LIMIT)
    }

    fn with_limits(
        collection: &str,
        mut objects: Vec<DataObject>,
        limit: u64,
        entry_limit: usize,
    ) -> Self {
        objects.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));

        let mut size = 0;
        let mut zip64 = false;
        let mut members = Vec::with_capacity(objects.len());
        for object in objects {
            let name = object.relative_path(collection).to_string();
            let member = Member {
                large: object.size >= limit,
                zip64_offset: zip64,
                object,
                name,
            };
            size += member.block_size();
            if size >= limit {
                zip64 = true;
            }
            members.push(member);
        }
        if members.len() > entry_limit {
            zip64 = true;
        }

        size += END_OF_CENTRAL_DIRECTORY;
        if zip64 {
            size += ZIP64_END_OF_CENTRAL_DIRECTORY + ZIP64_END_LOCATOR;
        }
        Self {
            members,
            size,
            zip64,
        }
    }

    /// The members of the archive, in order.
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// The exact size of the archive, in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }
}

impl Member {
    /// Bytes contributed to the archive by this member, including its central directory entry.
    fn block_size(&self) -> u64 {
        let name = self.name.len() as u64;
        self.object.size
            + LOCAL_HEADER
            + name
            + LOCAL_ZIP64_EXTRA
            + DATA_DESCRIPTOR
            + CENTRAL_HEADER
            + name
            + self.central_extra_size()
    }

    fn central_extra_size(&self) -> u64 {
        let fields = 2 * self.large as u64 + self.zip64_offset as u64;
        if fields == 0 {
            0
        } else {
            4 + 8 * fields
        }
    }
}

/// Little-endian serialization of zip records.
#[derive(Default)]
struct Record(Vec<u8>);

impl Record {
    fn u16(mut self, n: u16) -> Self {
        self.0.extend_from_slice(&n.to_le_bytes());
        self
    }

    fn u32(mut self, n: u32) -> Self {
        self.0.extend_from_slice(&n.to_le_bytes());
        self
    }

    fn u64(mut self, n: u64) -> Self {
        self.0.extend_from_slice(&n.to_le_bytes());
        self
    }

    fn bytes(mut self, bytes: &[u8]) -> Self {
        self.0.extend_from_slice(bytes);
        self
    }
}

/// A 32-bit field, or the zip64 marker if the value lives in a zip64 field.
fn u32_or_marker(n: u64, zip64: bool) -> u32 {
    if zip64 {
        u32::MAX
    } else {
        n as u32
    }
}

/// The member currently being written.
struct Current {
    member: Member,
    offset: u64,
    written: u64,
    crc: crc32fast::Hasher,
    sha: Sha256,
}

/// Incremental encoder of a planned archive.
///
/// Every method returns the bytes to append to the archive, except [`data`](Self::data), whose
/// input is appended as is. The encoder keeps a running MD5 of the whole archive and a SHA-256
/// of each member's contents.
pub struct Encoder {
    zip64: bool,
    offset: u64,
    entries: u64,
    central: Vec<u8>,
    current: Option<Current>,
    md5: Md5,
    time: u16,
    date: u16,
}

impl Encoder {
    pub fn new(plan: &Plan) -> Self {
        let (time, date) = dos_timestamp(Local::now().naive_local());
        Self {
            zip64: plan.zip64,
            offset: 0,
            entries: 0,
            central: vec![],
            current: None,
            md5: Md5::new(),
            time,
            date,
        }
    }

    /// Start a member: its local header.
    pub fn begin(&mut self, member: &Member) -> Result<Vec<u8>, Error> {
        if let Some(current) = &self.current {
            return Err(Error::msg(format!(
                "cannot start {} before finishing {}",
                member.name, current.member.name
            )));
        }
        let header = Record::default()
            .u32(0x04034b50)
            .u16(VERSION)
            .u16(FLAGS)
            .u16(0)
            .u16(self.time)
            .u16(self.date)
            .u32(0)
            .u32(u32::MAX)
            .u32(u32::MAX)
            .u16(member.name.len() as u16)
            .u16(LOCAL_ZIP64_EXTRA as u16)
            .bytes(member.name.as_bytes())
            .u16(ZIP64_EXTRA_TAG)
            .u16(16)
            .u64(0)
            .u64(0)
            .0;
        self.current = Some(Current {
            member: member.clone(),
            offset: self.offset,
            written: 0,
            crc: crc32fast::Hasher::new(),
            sha: Sha256::new(),
        });
        Ok(self.emit(header))
    }

    /// Contents of the current member.
    pub fn data(&mut self, chunk: &[u8]) -> Result<(), Error> {
        let current = self
            .current
            .as_mut()
            .ok_or_else(|| Error::msg("no archive member has been started"))?;
        current.written += chunk.len() as u64;
        if current.written > current.member.object.size {
            return Err(Error::msg(format!(
                "{} is larger than the {} bytes planned",
                current.member.object.path, current.member.object.size
            )));
        }
        current.crc.update(chunk);
        current.sha.update(chunk);
        self.md5.update(chunk);
        self.offset += chunk.len() as u64;
        Ok(())
    }

    /// Finish the current member: its data descriptor.
    ///
    /// Also returns the SHA-256 of the member's contents, in hex.
    pub fn end(&mut self) -> Result<(Vec<u8>, String), Error> {
        let current = self
            .current
            .take()
            .ok_or_else(|| Error::msg("no archive member has been started"))?;
        let member = &current.member;
        if current.written != member.object.size {
            return Err(Error::msg(format!(
                "{} has {} bytes, {} were planned",
                member.object.path, current.written, member.object.size
            )));
        }
        let crc = current.crc.finalize();
        let size = member.object.size;

        let descriptor = Record::default()
            .u32(0x08074b50)
            .u32(crc)
            .u64(size)
            .u64(size)
            .0;

        let extra_size = member.central_extra_size();
        let mut extra = Record::default();
        if extra_size > 0 {
            extra = extra.u16(ZIP64_EXTRA_TAG).u16(extra_size as u16 - 4);
            if member.large {
                extra = extra.u64(size).u64(size);
            }
            if member.zip64_offset {
                extra = extra.u64(current.offset);
            }
        }
        let central = Record::default()
            .u32(0x02014b50)
            .u16(VERSION | (3 << 8))
            .u16(VERSION)
            .u16(FLAGS)
            .u16(0)
            .u16(self.time)
            .u16(self.date)
            .u32(crc)
            .u32(u32_or_marker(size, member.large))
            .u32(u32_or_marker(size, member.large))
            .u16(member.name.len() as u16)
            .u16(extra_size as u16)
            .u16(0)
            .u16(0)
            .u16(0)
            .u32(0o100644 << 16)
            .u32(u32_or_marker(current.offset, member.zip64_offset))
            .bytes(member.name.as_bytes())
            .bytes(&extra.0)
            .0;
        self.central.extend(central);
        self.entries += 1;

        let sha = format!("{:x}", current.sha.finalize());
        Ok((self.emit(descriptor), sha))
    }

    /// Finish the archive: the central directory and end records.
    ///
    /// Also returns the MD5 of the whole archive, in hex.
    pub fn finish(mut self) -> Result<(Vec<u8>, String), Error> {
        if let Some(current) = &self.current {
            return Err(Error::msg(format!(
                "member {} was not finished",
                current.member.name
            )));
        }
        let directory_offset = self.offset;
        let directory_size = self.central.len() as u64;
        let mut tail = std::mem::take(&mut self.central);

        if self.zip64 {
            let record_offset = directory_offset + directory_size;
            tail.extend(
                Record::default()
                    .u32(0x06064b50)
                    .u64(ZIP64_END_OF_CENTRAL_DIRECTORY - 12)
                    .u16(VERSION | (3 << 8))
                    .u16(VERSION)
                    .u32(0)
                    .u32(0)
                    .u64(self.entries)
                    .u64(self.entries)
                    .u64(directory_size)
                    .u64(directory_offset)
                    .u32(0x07064b50)
                    .u32(0)
                    .u64(record_offset)
                    .u32(1)
                    .0,
            );
        }
        // Counts and offsets that do not fit are saturated, which marks them as zip64 fields.
        let entries = self.entries.min(u16::MAX as u64) as u16;
        tail.extend(
            Record::default()
                .u32(0x06054b50)
                .u16(0)
                .u16(0)
                .u16(entries)
                .u16(entries)
                .u32(directory_size.min(u32::MAX as u64) as u32)
                .u32(directory_offset.min(u32::MAX as u64) as u32)
                .u16(0)
                .0,
        );

        let tail = self.emit(tail);
        Ok((tail, format!("{:x}", self.md5.finalize())))
    }

    fn emit(&mut self, bytes: Vec<u8>) -> Vec<u8> {
        self.md5.update(&bytes);
        self.offset += bytes.len() as u64;
        bytes
    }
}

fn dos_timestamp(now: NaiveDateTime) -> (u16, u16) {
    let time = (now.hour() << 11) | (now.minute() << 5) | (now.second() / 2);
    let date = ((now.year().max(1980) - 1980) as u32) << 9 | (now.month() << 5) | now.day();
    (time as u16, date as u16)
}

/// Checksums of a streamed archive.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Checksums {
    /// MD5 of the archive, in hex.
    pub md5: String,
    /// SHA-256 of each member's contents, in hex, by iRODS path.
    pub sha256: BTreeMap<String, String>,
}

/// Stream the archive planned by `plan` from `irods` into `sink`.
///
/// If `debug_archive` is given, the archive is also written to that file. On failure, the error
/// is sent to `sink` as well, so that its reader does not mistake a truncated archive for a
/// complete one.
pub async fn stream<I: Irods + ?Sized>(
    irods: &I,
    plan: &Plan,
    sink: Sender<io::Result<Vec<u8>>>,
    debug_archive: Option<&Path>,
) -> Result<Checksums, Error> {
    match stream_impl(irods, plan, &sink, debug_archive).await {
        Ok(digest) => Ok(digest),
        Err(err) => {
            // The reader may be gone already, in which case there is nobody left to tell.
            sink.send(Err(io::Error::new(io::ErrorKind::Other, err.to_string())))
                .await
                .ok();
            Err(err)
        }
    }
}

async fn stream_impl<I: Irods + ?Sized>(
    irods: &I,
    plan: &Plan,
    sink: &Sender<io::Result<Vec<u8>>>,
    debug_archive: Option<&Path>,
) -> Result<Checksums, Error> {
    let mut out = Output {
        sink,
        debug: match debug_archive {
            Some(path) => Some(File::create(path).await?),
            None => None,
        },
        emitted: 0,
        meter: Meter::new(plan.size()),
    };
    tracing::info!("bundle predicted size: {}", plan.size());

    let mut encoder = Encoder::new(plan);
    let mut sha256 = BTreeMap::new();
    for member in plan.members() {
        out.emit(encoder.begin(member)?).await?;
        let path = &member.object.path;
        let mut offset = 0;
        while offset < member.object.size {
            let count = BLOCK_SIZE.min((member.object.size - offset) as usize);
            let chunk = irods.read(path, offset, count).await?;
            if chunk.is_empty() {
                return Err(Error::msg(format!(
                    "{path} ended after {offset} of {} bytes",
                    member.object.size
                )));
            }
            encoder.data(&chunk)?;
            offset += chunk.len() as u64;
            out.emit(chunk).await?;
        }
        let (descriptor, sha) = encoder.end()?;
        tracing::info!("buffer {} SHA-256: {sha}", member.name);
        sha256.insert(path.clone(), sha);
        out.emit(descriptor).await?;
    }
    let (tail, md5) = encoder.finish()?;
    out.emit(tail).await?;
    if out.emitted != plan.size() {
        return Err(Error::msg(format!(
            "bundle has {} bytes, {} were predicted",
            out.emitted,
            plan.size()
        )));
    }
    if let Some(mut debug) = out.debug {
        debug.flush().await?;
    }
    Ok(Checksums { md5, sha256 })
}

struct Output<'a> {
    sink: &'a Sender<io::Result<Vec<u8>>>,
    debug: Option<File>,
    emitted: u64,
    meter: Meter,
}

/// Tracks progress through the archive in steps of 10%.
struct Meter {
    total: u64,
    reported: u64,
}

impl Meter {
    fn new(total: u64) -> Self {
        Self { total, reported: 0 }
    }

    /// The percentage to report after `emitted` bytes, if a new step was reached.
    fn advance(&mut self, emitted: u64) -> Option<u64> {
        let decile = (emitted.saturating_mul(10) / self.total.max(1)).min(10);
        if decile > self.reported {
            self.reported = decile;
            Some(decile * 10)
        } else {
            None
        }
    }
}

impl<'a> Output<'a> {
    async fn emit(&mut self, bytes: Vec<u8>) -> Result<(), Error> {
        if bytes.is_empty() {
            return Ok(());
        }
        if let Some(debug) = &mut self.debug {
            debug.write_all(&bytes).await?;
        }
        self.emitted += bytes.len() as u64;
        self.sink
            .send(Ok(bytes))
            .await
            .map_err(|_| Error::msg("bundle upload was aborted"))?;
        if let Some(percent) = self.meter.advance(self.emitted) {
            tracing::info!(
                "bundle progress: {}/{} bytes ({percent}%)",
                self.emitted,
                self.meter.total
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::irods::mock::MockIrods;
    use async_std::channel;
    use futures::StreamExt;
    use std::io::{Cursor, Read};
    use zip::ZipArchive;

    fn object(path: &str, size: u64) -> DataObject {
        DataObject::new(path, size)
    }

    #[test]
    fn test_select() {
        let objects = vec![
            object("/z/c/a.txt", 1),
            object("/z/c/sub/b.txt", 2),
            object("/z/c/c.txt", 3),
        ];
        assert_eq!(select("/z/c", objects.clone(), ""), objects);
        assert_eq!(
            select("/z/c", objects.clone(), "sub/b.txt, /c.txt"),
            [object("/z/c/sub/b.txt", 2), object("/z/c/c.txt", 3)]
        );
        assert!(select("/z/c", objects, "missing.txt").is_empty());
    }

    #[test]
    fn test_plan_small() {
        let plan = Plan::new(
            "/z/c",
            vec![object("/z/c/a.txt", 10), object("/z/c/bb.txt", 20)],
        );
        // Largest first.
        assert_eq!(plan.members()[0].name, "bb.txt");
        assert_eq!(plan.members()[1].name, "a.txt");
        // Each member: data + local header, name, zip64 extra, descriptor + central header, name.
        let expected = (20 + 30 + 6 + 20 + 24 + 46 + 6) + (10 + 30 + 5 + 20 + 24 + 46 + 5) + 22;
        assert_eq!(plan.size(), expected);
        assert!(!plan.zip64);
    }

    #[test]
    fn test_plan_large() {
        let big = ZIP64_LIMIT + 1;
        let plan = Plan::new(
            "/z/c",
            vec![
                object("/z/c/small", 1),
                object("/z/c/big1", big),
                object("/z/c/big2", big),
            ],
        );
        let names = plan
            .members()
            .iter()
            .map(|m| m.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, ["big1", "big2", "small"]);

        // The first large member is at offset 0, so only its sizes need zip64 fields. Past it,
        // the archive is in zip64 territory and every offset needs a zip64 field too.
        let first = big + 30 + 4 + 20 + 24 + 46 + 4 + 20;
        let second = big + 30 + 4 + 20 + 24 + 46 + 4 + 28;
        let third = 1 + 30 + 5 + 20 + 24 + 46 + 5 + 12;
        assert_eq!(plan.size(), first + second + third + 22 + 56 + 20);
        assert!(plan.zip64);
    }

    #[test]
    fn test_plan_duplicate_sizes() {
        let plan = Plan::new(
            "/z/c",
            vec![object("/z/c/b", 5), object("/z/c/a", 5), object("/z/c/c", 5)],
        );
        let names = plan
            .members()
            .iter()
            .map(|m| m.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn test_encoder_misuse() {
        let plan = Plan::new("/z/c", vec![object("/z/c/a", 3)]);
        let member = plan.members()[0].clone();

        let mut encoder = Encoder::new(&plan);
        assert!(encoder.data(b"abc").is_err());
        encoder.begin(&member).unwrap();
        assert!(encoder.begin(&member).is_err());
        assert!(encoder.data(b"abcd").is_err());

        let mut encoder = Encoder::new(&plan);
        encoder.begin(&member).unwrap();
        encoder.data(b"ab").unwrap();
        assert!(encoder.end().is_err());

        let mut encoder = Encoder::new(&plan);
        encoder.begin(&member).unwrap();
        assert!(encoder.finish().is_err());
    }

    async fn bundle(irods: &MockIrods, plan: &Plan) -> (Vec<u8>, Checksums) {
        let (sender, receiver) = channel::bounded(2);
        let (digest, chunks) = futures::join!(
            stream(irods, plan, sender, None),
            receiver.collect::<Vec<_>>()
        );
        let bytes = chunks
            .into_iter()
            .map(Result::unwrap)
            .flatten()
            .collect::<Vec<_>>();
        (bytes, digest.unwrap())
    }

    fn check_archive(bytes: Vec<u8>, files: &[(&str, &[u8])]) {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), files.len());
        for (name, contents) in files {
            let mut file = archive.by_name(name).unwrap();
            let mut read = vec![];
            file.read_to_end(&mut read).unwrap();
            assert_eq!(read, *contents);
        }
    }

    #[async_std::test]
    async fn test_stream() {
        let big = (0..3 * BLOCK_SIZE / 2).map(|i| i as u8).collect::<Vec<_>>();
        let irods = MockIrods::default()
            .with_file("/z/c/empty", vec![])
            .with_file("/z/c/hello.txt", b"hello world".to_vec())
            .with_file("/z/c/sub/big.bin", big.clone());
        let plan = Plan::new("/z/c", irods.list("/z/c").await.unwrap());

        let (bytes, digest) = bundle(&irods, &plan).await;
        assert_eq!(bytes.len() as u64, plan.size());
        assert_eq!(digest.md5, format!("{:x}", Md5::digest(&bytes)));
        assert_eq!(
            digest.sha256["/z/c/hello.txt"],
            format!("{:x}", Sha256::digest(b"hello world"))
        );
        assert_eq!(
            digest.sha256["/z/c/sub/big.bin"],
            irods.checksum("/z/c/sub/big.bin").await.unwrap()
        );
        assert_eq!(digest.sha256.len(), 3);

        check_archive(
            bytes,
            &[
                ("empty", &b""[..]),
                ("hello.txt", &b"hello world"[..]),
                ("sub/big.bin", &big[..]),
            ],
        );
    }

    #[async_std::test]
    async fn test_stream_zip64() {
        // Pretend the zip64 limit is tiny, to exercise the zip64 layout with small files.
        let irods = MockIrods::default()
            .with_file("/z/c/a", vec![b'a'; 300])
            .with_file("/z/c/b", vec![b'b'; 200])
            .with_file("/z/c/c", vec![b'c'; 10]);
        let plan = Plan::with_limits(
            "/z/c",
            irods.list("/z/c").await.unwrap(),
            250,
            ZIP64_ENTRY_LIMIT,
        );
        assert!(plan.zip64);
        assert!(plan.members()[0].large && !plan.members()[0].zip64_offset);
        assert!(plan.members()[1].zip64_offset);

        let (bytes, _) = bundle(&irods, &plan).await;
        assert_eq!(bytes.len() as u64, plan.size());
        check_archive(
            bytes,
            &[
                ("a", &[b'a'; 300][..]),
                ("b", &[b'b'; 200][..]),
                ("c", &[b'c'; 10][..]),
            ],
        );
    }

    #[async_std::test]
    async fn test_stream_many_entries() {
        // Pretend the entry limit is tiny, so that the member count alone calls for zip64.
        let irods = MockIrods::default()
            .with_file("/z/c/a", b"a".to_vec())
            .with_file("/z/c/b", b"b".to_vec())
            .with_file("/z/c/c", vec![]);
        let plan = Plan::with_limits("/z/c", irods.list("/z/c").await.unwrap(), ZIP64_LIMIT, 2);
        assert!(plan.zip64);
        assert!(plan.members().iter().all(|m| !m.large && !m.zip64_offset));
        let small = Plan::new("/z/c", irods.list("/z/c").await.unwrap());
        assert_eq!(
            plan.size(),
            small.size() + ZIP64_END_OF_CENTRAL_DIRECTORY + ZIP64_END_LOCATOR
        );

        let (bytes, _) = bundle(&irods, &plan).await;
        assert_eq!(bytes.len() as u64, plan.size());
        // The zip64 end locator sits right before the end record.
        let locator = bytes.len() - END_OF_CENTRAL_DIRECTORY as usize - ZIP64_END_LOCATOR as usize;
        assert_eq!(bytes[locator..locator + 4], 0x07064b50u32.to_le_bytes());
        check_archive(bytes, &[("a", &b"a"[..]), ("b", &b"b"[..]), ("c", &b""[..])]);
    }

    #[async_std::test]
    async fn test_stream_debug_archive() {
        let irods = MockIrods::default()
            .with_file("/z/c/hello.txt", b"hello world".to_vec())
            .with_file("/z/c/sub/bye.txt", b"goodbye".to_vec());
        let plan = Plan::new("/z/c", irods.list("/z/c").await.unwrap());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.zip");

        let (sender, receiver) = channel::bounded(2);
        let (digest, chunks) = futures::join!(
            stream(&irods, &plan, sender, Some(&path)),
            receiver.collect::<Vec<_>>()
        );
        let digest = digest.unwrap();
        let bytes = chunks
            .into_iter()
            .map(Result::unwrap)
            .flatten()
            .collect::<Vec<_>>();

        let copy = std::fs::read(&path).unwrap();
        assert_eq!(copy, bytes);
        assert_eq!(digest.md5, format!("{:x}", Md5::digest(&copy)));
        check_archive(
            copy,
            &[("hello.txt", &b"hello world"[..]), ("sub/bye.txt", &b"goodbye"[..])],
        );
    }

    #[test]
    fn test_meter() {
        let mut meter = Meter::new(1000);
        assert_eq!(meter.advance(50), None);
        assert_eq!(meter.advance(100), Some(10));
        assert_eq!(meter.advance(150), None);
        // Skipped steps are reported once, at the latest one reached.
        assert_eq!(meter.advance(420), Some(40));
        assert_eq!(meter.advance(1000), Some(100));
        assert_eq!(meter.advance(1000), None);

        // Archives smaller than ten bytes jump straight to the end.
        let mut meter = Meter::new(3);
        assert_eq!(meter.advance(1), Some(30));
        assert_eq!(meter.advance(2), Some(60));
        assert_eq!(meter.advance(3), Some(100));
        assert_eq!(meter.advance(4), None);

        let mut meter = Meter::new(0);
        assert_eq!(meter.advance(0), None);
        assert_eq!(meter.advance(5), Some(100));
    }

    #[async_std::test]
    async fn test_stream_truncated_object() {
        let irods = MockIrods::default().with_file("/z/c/a", b"abc".to_vec());
        // Plan for more bytes than iRODS will deliver.
        let plan = Plan::new("/z/c", vec![object("/z/c/a", 10)]);
        let (sender, receiver) = channel::bounded(2);
        let (res, chunks) = futures::join!(
            stream(&irods, &plan, sender, None),
            receiver.collect::<Vec<_>>()
        );
        assert!(res.is_err());
        // The reader is told the archive is broken.
        assert!(chunks.last().unwrap().is_err());
    }

    #[test]
    fn test_dos_timestamp() {
        let t = NaiveDateTime::parse_from_str("2021-03-04 13:14:15", "%Y-%m-%d %H:%M:%S").unwrap();
        let (time, date) = dos_timestamp(t);
        assert_eq!(time, (13 << 11) | (14 << 5) | 7);
        assert_eq!(date, (41 << 9) | (3 << 5) | 4);
    }
}

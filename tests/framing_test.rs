use starsfile::bits::{push16, push32};
use starsfile::block::BlockHeader;
use starsfile::records::universe::NAME_LEN;
use starsfile::records::{PlanetCoord, Record};
use starsfile::test_utils::{frame, sample_header, FileBuilder};
use starsfile::text::pack_text;
use starsfile::{BlockType, PlainKeystream, StarsError, StarsFile, StarsKeystream};

use test_log::test;

fn universe_payload(planet_count: u16) -> Vec<u8> {
    let mut out = Vec::new();
    push32(&mut out, 0x2b4c_7e19);
    push16(&mut out, 1); // small
    push16(&mut out, 2); // dense
    push16(&mut out, 2);
    push16(&mut out, planet_count);
    push32(&mut out, 0);
    push16(&mut out, 0);
    push16(&mut out, 0);
    out.extend_from_slice(&[0x80, 0x02, 0x81, 0x00, 0, 0, 0, 0, 0, 0x05, 0x00, 0x00]);
    let mut name = b"Wolfpack".to_vec();
    name.resize(NAME_LEN, 0);
    out.extend_from_slice(&name);
    out
}

fn coordinates(entries: &[(u16, u16, u16)]) -> Vec<u8> {
    let mut out = Vec::new();
    for &(name_id, y, dx) in entries {
        push32(&mut out, (name_id as u32) << 22 | (y as u32) << 10 | dx as u32);
    }
    out
}

fn named_plan() -> Vec<u8> {
    let mut plan = vec![0x12, 0x05, 0x31, 0x01];
    let name = pack_text("Kill Starbase");
    plan.push(name.len() as u8);
    plan.extend_from_slice(&name);
    plan
}

fn sample_file() -> FileBuilder {
    FileBuilder::new(sample_header())
        .planets(
            &universe_payload(3),
            &coordinates(&[(4, 1100, 40), (17, 1300, 200), (90, 1050, 3)]),
        )
        .block(BlockType::BattlePlan, &named_plan())
        .block(BlockType::BattlePlan, &[0x31, 0x84, 0x00, 0x00])
        .block(BlockType::Events, &[0x01, 0x02, 0x03, 0x04, 0x05])
        .footer(0xBEEF)
}

/// Walk headers the way the framer does and return where the walk ended.
fn walk(bytes: &[u8], planet_trailer: usize) -> usize {
    let mut offset = 0;
    while offset + 2 <= bytes.len() {
        let word = u16::from_le_bytes([bytes[offset], bytes[offset + 1]]);
        let header = BlockHeader::from_word(word);
        offset += 2 + header.size;
        if header.kind() == BlockType::Planets {
            offset += planet_trailer;
        }
    }
    offset
}

#[test]
fn test_empty_input() {
    assert_eq!(
        StarsFile::parse(&[], &mut PlainKeystream),
        Err(StarsError::HeaderTooShort { len: 0 })
    );
}

#[test]
fn test_missing_header_yields_no_records() {
    let mut bytes = frame(BlockType::BattlePlan, &[0x31, 0x84, 0, 0]);
    bytes.extend(frame(BlockType::FileHeader, &sample_header().encode()));
    let err = StarsFile::parse(&bytes, &mut StarsKeystream::new()).unwrap_err();
    assert_eq!(err, StarsError::NoFileHeaderFound { found: 30 });
    assert!(err.to_string().contains("30"));
}

#[test]
fn test_encrypted_file_round_trip() {
    let bytes = sample_file().build(&mut StarsKeystream::new());
    let file = StarsFile::parse(&bytes, &mut StarsKeystream::new()).unwrap();

    assert_eq!(file.blocks.len(), 6);
    assert_eq!(file.header(), Some(&sample_header()));
    assert_eq!(file.opaque_count(), 1); // only the Events block

    match &file.blocks[1].record {
        Record::Universe(u) => {
            assert_eq!(u.name, "Wolfpack");
            assert_eq!(u.planets.len(), 3);
            assert_eq!(u.planets[0].x, 1040);
            assert_eq!(u.planets[2].x, 1243);
            assert_eq!(u.planets[2].y, 1050);
        }
        other => panic!("expected universe, got {:?}", other),
    }
    match &file.blocks[2].record {
        Record::BattlePlan(plan) => assert_eq!(plan.name.to_string(), "Kill Starbase"),
        other => panic!("expected battle plan, got {:?}", other),
    }
    match &file.blocks[5].record {
        Record::FileFooter(footer) => assert_eq!(footer.checksum, Some(0xBEEF)),
        other => panic!("expected footer, got {:?}", other),
    }

    assert_eq!(file.to_bytes(&mut StarsKeystream::new()).unwrap(), bytes);
}

#[test]
fn test_ciphertext_differs_from_plaintext() {
    let encrypted = sample_file().build(&mut StarsKeystream::new());
    let plain = sample_file().build(&mut PlainKeystream);
    assert_eq!(encrypted.len(), plain.len());
    assert_ne!(encrypted, plain);

    // Header, coordinate trailer and footer are never encrypted
    assert_eq!(encrypted[..18], plain[..18]);
    assert_eq!(encrypted[encrypted.len() - 4..], plain[plain.len() - 4..]);

    let a = StarsFile::parse(&encrypted, &mut StarsKeystream::new()).unwrap();
    let b = StarsFile::parse(&plain, &mut PlainKeystream).unwrap();
    let records_a: Vec<_> = a.blocks.iter().map(|blk| &blk.record).collect();
    let records_b: Vec<_> = b.blocks.iter().map(|blk| &blk.record).collect();
    assert_eq!(records_a, records_b);
}

#[test]
fn test_framing_ends_at_buffer_end() {
    let bytes = sample_file().build(&mut PlainKeystream);
    assert_eq!(walk(&bytes, 3 * 4), bytes.len());

    let file = StarsFile::parse(&bytes, &mut PlainKeystream).unwrap();
    let covered: usize = file.blocks.iter().map(|b| b.raw.framed_len()).sum();
    assert_eq!(covered, bytes.len());
}

#[test]
fn test_missing_coordinate_trailer() {
    let bytes = FileBuilder::new(sample_header())
        .planets(&universe_payload(3), &coordinates(&[(4, 1100, 40)]))
        .build(&mut PlainKeystream);
    assert!(matches!(
        StarsFile::parse(&bytes, &mut PlainKeystream),
        Err(StarsError::BlockOverrun { declared: 12, remaining: 4, .. })
    ));
}

#[test]
fn test_bad_magic_and_version() {
    let mut header = sample_header().encode();
    header[0] = b'X';
    assert!(matches!(
        StarsFile::parse(&frame(BlockType::FileHeader, &header), &mut PlainKeystream),
        Err(StarsError::BadMagic { .. })
    ));

    let short = frame(BlockType::FileHeader, &sample_header().encode()[..10]);
    assert_eq!(
        StarsFile::parse(&short, &mut PlainKeystream),
        Err(StarsError::HeaderTooShort { len: 10 })
    );
}

#[test]
fn test_edited_record_is_written_back() {
    let bytes = sample_file().build(&mut StarsKeystream::new());
    let mut file = StarsFile::parse(&bytes, &mut StarsKeystream::new()).unwrap();
    if let Record::BattlePlan(plan) = &mut file.blocks[3].record {
        plan.tactic = 2;
    }
    let edited = file.to_bytes(&mut StarsKeystream::new()).unwrap();
    assert_ne!(edited, bytes);

    let reread = StarsFile::parse(&edited, &mut StarsKeystream::new()).unwrap();
    match &reread.blocks[3].record {
        Record::BattlePlan(plan) => assert_eq!(plan.tactic, 2),
        other => panic!("expected battle plan, got {:?}", other),
    }
    assert_eq!(reread.blocks[4].raw.plaintext, vec![0x01, 0x02, 0x03, 0x04, 0x05]);
}

#[test]
fn test_write_requires_header_first() {
    let bytes = sample_file().build(&mut StarsKeystream::new());
    let mut file = StarsFile::parse(&bytes, &mut StarsKeystream::new()).unwrap();
    file.blocks.remove(0);
    assert_eq!(
        file.to_bytes(&mut StarsKeystream::new()),
        Err(StarsError::NoFileHeaderFound { found: 7 })
    );

    file.blocks.clear();
    assert_eq!(
        file.to_bytes(&mut StarsKeystream::new()),
        Err(StarsError::HeaderTooShort { len: 0 })
    );
}

#[test]
fn test_added_planet_needs_matching_count() {
    let bytes = sample_file().build(&mut StarsKeystream::new());
    let mut file = StarsFile::parse(&bytes, &mut StarsKeystream::new()).unwrap();
    if let Record::Universe(u) = &mut file.blocks[1].record {
        u.planets.push(PlanetCoord {
            planet_id: 3,
            name_id: 120,
            x: 1300,
            y: 1400,
        });
    }
    assert_eq!(
        file.to_bytes(&mut StarsKeystream::new()),
        Err(StarsError::PlanetCountMismatch {
            count: 3,
            planets: 4
        })
    );

    if let Record::Universe(u) = &mut file.blocks[1].record {
        u.planet_count = 4;
    }
    let written = file.to_bytes(&mut StarsKeystream::new()).unwrap();
    let reread = StarsFile::parse(&written, &mut StarsKeystream::new()).unwrap();
    match &reread.blocks[1].record {
        Record::Universe(u) => assert_eq!(u.planets.len(), 4),
        other => panic!("expected universe, got {:?}", other),
    }
}

#[test]
fn test_undecoded_battle_keeps_its_continuation() {
    let mut first = vec![
        0x01, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, //
        0xE8, 0x03, 0xD0, 0x07, 0x00, 0x00, 0x00, 0x00,
    ];
    first.extend_from_slice(&[0, 0, 0x01, 0, 1, 0, 0, 0x4A, 0x64, 0, 0, 0, 0, 0]);
    first.extend_from_slice(&[0x01, 0x00, 0x00, 0x04]);

    // Declares six stacks but carries one
    let mut second = vec![
        0x02, 0x01, 0x03, 0x03, 0x00, 0x00, 0x00, 0x00, //
        0xE8, 0x03, 0xD0, 0x07, 0x00, 0x00, 0x00, 0x00,
    ];
    second.extend_from_slice(&[1, 0, 0x02, 0, 1, 0, 1, 0x53, 0x64, 0, 0, 0, 0, 0]);

    let bytes = FileBuilder::new(sample_header())
        .block(BlockType::Battle, &first)
        .block(BlockType::Battle, &second)
        .block(BlockType::BattleContinuation, &[0xAA, 0xBB, 0xCC])
        .build(&mut StarsKeystream::new());
    let file = StarsFile::parse(&bytes, &mut StarsKeystream::new()).unwrap();
    assert!(file.blocks[2].record.is_opaque());

    let battles = file.battles();
    assert_eq!(battles.len(), 1);
    assert_eq!(battles[0].battle.battle_id, 1);
    assert_eq!(battles[0].actions, vec![0x01, 0x00, 0x00, 0x04]);
    assert_eq!(battles[0].continuation_blocks, 0);
    assert_eq!(file.to_bytes(&mut StarsKeystream::new()).unwrap(), bytes);
}

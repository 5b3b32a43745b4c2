use std::collections::{BTreeMap, VecDeque};

use midly::{MetaMessage, MidiMessage, Smf, TrackEventKind};

use super::timing::TickClock;
use super::{ImportedMidi, MidiImportError, Result};
use crate::models::{NoteEvent, TimeSignature};

/// General MIDI percussion channel (10, zero-based 9)
const DRUM_CHANNEL: u8 = 9;

/// Parse Standard MIDI File bytes into note events
pub fn parse_midi(bytes: &[u8]) -> Result<ImportedMidi> {
    let smf = Smf::parse(bytes).map_err(|e| MidiImportError::Parse(e.to_string()))?;
    let clock = TickClock::from_smf(&smf)?;

    let mut notes = Vec::new();
    let mut skipped_drums = 0usize;
    for (index, track) in smf.tracks.iter().enumerate() {
        let mut reader = TrackNotes::default();
        let mut tick: u64 = 0;
        for event in track {
            tick += event.delta.as_int() as u64;
            if let TrackEventKind::Midi { channel, message } = event.kind {
                let channel = channel.as_int();
                if channel == DRUM_CHANNEL {
                    skipped_drums += 1;
                    continue;
                }
                reader.handle(channel, message, tick, &clock, &mut notes);
            }
        }
        let dangling = reader.close_all(tick, &clock, &mut notes);
        if dangling > 0 {
            log::warn!("midi import: track {} ended with {} notes still sounding", index, dangling);
        }
    }

    if skipped_drums > 0 {
        log::debug!("midi import: skipped {} percussion events", skipped_drums);
    }

    notes.sort_by(|a, b| a.start_time.total_cmp(&b.start_time).then(a.pitch.cmp(&b.pitch)));

    let imported = ImportedMidi {
        notes,
        tempo_map: clock.tempo_map(),
        time_signature: first_time_signature(&smf),
    };
    log::info!(
        "midi import: {} tracks, {} notes, {} tempo changes",
        smf.tracks.len(),
        imported.notes.len(),
        imported.tempo_map.len()
    );
    Ok(imported)
}

/// Open notes of one track keyed by (channel, key), paired first-in first-out
#[derive(Default)]
struct TrackNotes {
    open: BTreeMap<(u8, u8), VecDeque<(u64, u8)>>,
}

impl TrackNotes {
    fn handle(&mut self, channel: u8, message: MidiMessage, tick: u64, clock: &TickClock, out: &mut Vec<NoteEvent>) {
        match message {
            MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                self.open
                    .entry((channel, key.as_int()))
                    .or_default()
                    .push_back((tick, vel.as_int()));
            }
            MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                let key = key.as_int();
                match self.open.get_mut(&(channel, key)).and_then(VecDeque::pop_front) {
                    Some((start, velocity)) => out.push(note_event(key, start, tick, velocity, clock)),
                    None => log::debug!("midi import: note off without note on (key {})", key),
                }
            }
            _ => {}
        }
    }

    /// Close everything still sounding at `end_tick`; returns how many
    fn close_all(self, end_tick: u64, clock: &TickClock, out: &mut Vec<NoteEvent>) -> usize {
        let mut count = 0;
        for ((_, key), pending) in self.open {
            for (start, velocity) in pending {
                out.push(note_event(key, start, end_tick, velocity, clock));
                count += 1;
            }
        }
        count
    }
}

fn note_event(key: u8, start_tick: u64, end_tick: u64, velocity: u8, clock: &TickClock) -> NoteEvent {
    NoteEvent::new(key, clock.seconds_at(start_tick), clock.seconds_at(end_tick), velocity)
}

fn first_time_signature(smf: &Smf) -> Option<TimeSignature> {
    let mut found: Option<(u64, TimeSignature)> = None;
    for track in &smf.tracks {
        let mut tick: u64 = 0;
        for event in track {
            tick += event.delta.as_int() as u64;
            if let TrackEventKind::Meta(MetaMessage::TimeSignature(num, denom_pow, _, _)) = event.kind {
                if num == 0 || denom_pow > 6 {
                    continue;
                }
                let ts = TimeSignature::new(num as u32, 1u32 << denom_pow);
                if found.map_or(true, |(t, _)| tick < t) {
                    found = Some((tick, ts));
                }
                break;
            }
        }
    }
    found.map(|(_, ts)| ts)
}

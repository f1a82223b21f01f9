//! TraCI wire format.
//!
//! All integers and doubles are big-endian.
//!
//! ```text
//! message  := i32 total_len (includes these 4 bytes) · command*
//! command  := u8 len · u8 id · content           if len fits in a byte
//!           | u8 0 · i32 len · u8 id · content   otherwise
//! string   := i32 byte_len · UTF-8 bytes
//! ```
//!
//! A reply starts with one status command per request command
//! (`id · u8 result · string description`), optionally followed by the
//! request's response commands.

use std::io::{Read, Write};

use ct_core::XyPoint;

use crate::{SimError, SimResult};

// ── Protocol constants ────────────────────────────────────────────────────────

pub const CMD_SIMSTEP: u8 = 0x02;
pub const CMD_CLOSE:   u8 = 0x7F;

pub const CMD_GET_SIM_VARIABLE:       u8 = 0xab;
pub const RESPONSE_GET_SIM_VARIABLE:  u8 = 0xbb;
pub const CMD_SUBSCRIBE_SIM_VARIABLE: u8 = 0xdb;
pub const RESPONSE_SUBSCRIBE_SIM_VARIABLE: u8 = 0xeb;
pub const CMD_SUBSCRIBE_VEHICLE_VARIABLE:  u8 = 0xd4;
pub const RESPONSE_SUBSCRIBE_VEHICLE_VARIABLE: u8 = 0xe4;

pub const VAR_POSITION:                     u8 = 0x42;
pub const VAR_TIME:                         u8 = 0x66;
pub const VAR_DEPARTED_VEHICLES_IDS:        u8 = 0x74;
pub const VAR_TELEPORT_ENDING_VEHICLES_IDS: u8 = 0x78;
pub const VAR_ARRIVED_VEHICLES_IDS:         u8 = 0x7a;
pub const VAR_NET_BOUNDING_BOX:             u8 = 0x7c;
pub const VAR_MIN_EXPECTED_VEHICLES:        u8 = 0x7d;

pub const POSITION_2D:      u8 = 0x01;
pub const TYPE_BOUNDINGBOX: u8 = 0x05;
pub const TYPE_POLYGON:     u8 = 0x06;
pub const TYPE_UBYTE:       u8 = 0x07;
pub const TYPE_INTEGER:     u8 = 0x09;
pub const TYPE_DOUBLE:      u8 = 0x0B;
pub const TYPE_STRING:      u8 = 0x0C;
pub const TYPE_STRINGLIST:  u8 = 0x0E;

pub const RTYPE_OK:             u8 = 0x00;
pub const RTYPE_NOTIMPLEMENTED: u8 = 0x01;
pub const RTYPE_ERR:            u8 = 0xFF;

/// "Whole simulation" for subscription begin/end times.
pub const INVALID_DOUBLE_VALUE: f64 = -1_073_741_824.0;

// ── Outgoing messages ─────────────────────────────────────────────────────────

/// Builder for one outgoing TraCI message.
#[derive(Debug, Default)]
pub struct MessageBuilder {
    commands: Vec<u8>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one command with the correct (short or extended) length prefix.
    pub fn command(mut self, id: u8, content: &[u8]) -> Self {
        let short_len = content.len() + 2;
        if short_len <= usize::from(u8::MAX) {
            self.commands.push(short_len as u8);
        } else {
            self.commands.push(0);
            self.commands.extend_from_slice(&((content.len() + 6) as i32).to_be_bytes());
        }
        self.commands.push(id);
        self.commands.extend_from_slice(content);
        self
    }

    /// The framed message bytes.
    pub fn finish(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.commands.len() + 4);
        out.extend_from_slice(&((self.commands.len() + 4) as i32).to_be_bytes());
        out.extend_from_slice(&self.commands);
        out
    }
}

/// Content encoder for command bodies.
#[derive(Debug, Default)]
pub struct Content(Vec<u8>);

impl Content {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(mut self, v: u8) -> Self {
        self.0.push(v);
        self
    }

    pub fn i32(mut self, v: i32) -> Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn f64(mut self, v: f64) -> Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn string(mut self, s: &str) -> Self {
        self.0.extend_from_slice(&(s.len() as i32).to_be_bytes());
        self.0.extend_from_slice(s.as_bytes());
        self
    }

    pub fn string_list(mut self, items: &[&str]) -> Self {
        self.0.extend_from_slice(&(items.len() as i32).to_be_bytes());
        for s in items {
            self = self.string(s);
        }
        self
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// `simulationStep(0)`: advance exactly one step.
pub fn simulation_step() -> Vec<u8> {
    MessageBuilder::new()
        .command(CMD_SIMSTEP, &Content::new().f64(0.0).into_bytes())
        .finish()
}

/// Subscribe `vars` of `object` for the whole simulation.
pub fn subscribe(cmd: u8, object: &str, vars: &[u8]) -> Vec<u8> {
    let mut content = Content::new()
        .f64(INVALID_DOUBLE_VALUE)
        .f64(INVALID_DOUBLE_VALUE)
        .string(object)
        .u8(vars.len() as u8);
    for &v in vars {
        content = content.u8(v);
    }
    MessageBuilder::new().command(cmd, &content.into_bytes()).finish()
}

/// Read one variable of the simulation domain.
pub fn get_sim_variable(var: u8) -> Vec<u8> {
    MessageBuilder::new()
        .command(CMD_GET_SIM_VARIABLE, &Content::new().u8(var).string("").into_bytes())
        .finish()
}

pub fn close() -> Vec<u8> {
    MessageBuilder::new().command(CMD_CLOSE, &[]).finish()
}

// ── Incoming messages ─────────────────────────────────────────────────────────

/// A decoded variable value.
#[derive(Clone, Debug, PartialEq)]
pub enum TraciValue {
    Position(XyPoint),
    Polygon(Vec<XyPoint>),
    Ubyte(u8),
    Int(i32),
    Double(f64),
    String(String),
    StringList(Vec<String>),
}

impl TraciValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            TraciValue::Position(_)   => "position",
            TraciValue::Polygon(_)    => "polygon",
            TraciValue::Ubyte(_)      => "ubyte",
            TraciValue::Int(_)        => "integer",
            TraciValue::Double(_)     => "double",
            TraciValue::String(_)     => "string",
            TraciValue::StringList(_) => "string list",
        }
    }
}

/// One variable inside a subscription response.  `Err` carries the
/// simulation's error message for that variable.
pub type VarResult = Result<TraciValue, String>;

/// A decoded subscription response command.
#[derive(Clone, Debug, PartialEq)]
pub struct SubscriptionResponse {
    pub response_id: u8,
    pub object_id:   String,
    pub vars:        Vec<(u8, VarResult)>,
}

/// Cursor over a received message body.
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn take(&mut self, n: usize) -> SimResult<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|&e| e <= self.buf.len()).ok_or_else(|| {
            SimError::simulation(format!(
                "truncated TraCI message: need {n} bytes at offset {}, have {}",
                self.pos,
                self.buf.len() - self.pos
            ))
        })?;
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take_array<const N: usize>(&mut self) -> SimResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn u8(&mut self) -> SimResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn i32(&mut self) -> SimResult<i32> {
        Ok(i32::from_be_bytes(self.take_array()?))
    }

    pub fn f64(&mut self) -> SimResult<f64> {
        Ok(f64::from_be_bytes(self.take_array()?))
    }

    fn len(&mut self) -> SimResult<usize> {
        let n = self.i32()?;
        usize::try_from(n).map_err(|_| SimError::simulation(format!("negative TraCI length {n}")))
    }

    pub fn string(&mut self) -> SimResult<String> {
        let n = self.len()?;
        let bytes = self.take(n)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| SimError::simulation("TraCI string is not valid UTF-8"))
    }

    pub fn string_list(&mut self) -> SimResult<Vec<String>> {
        let n = self.len()?;
        (0..n).map(|_| self.string()).collect()
    }

    /// Split off the next command and return `(id, content decoder)`.
    pub fn command(&mut self) -> SimResult<(u8, Decoder<'a>)> {
        let short = self.u8()?;
        let content_len = if short == 0 {
            self.len()?.checked_sub(6)
        } else {
            usize::from(short).checked_sub(2)
        };
        let content_len =
            content_len.ok_or_else(|| SimError::simulation("TraCI command length too small"))?;
        let id = self.u8()?;
        let content = self.take(content_len)?;
        Ok((id, Decoder::new(content)))
    }

    /// Decode a typed value.
    pub fn value(&mut self) -> SimResult<TraciValue> {
        let ty = self.u8()?;
        Ok(match ty {
            POSITION_2D => TraciValue::Position(XyPoint::new(self.f64()?, self.f64()?)),
            TYPE_BOUNDINGBOX => {
                let (x0, y0, x1, y1) = (self.f64()?, self.f64()?, self.f64()?, self.f64()?);
                TraciValue::Polygon(vec![XyPoint::new(x0, y0), XyPoint::new(x1, y1)])
            }
            TYPE_POLYGON => {
                let n = match self.u8()? {
                    0 => self.len()?,
                    n => usize::from(n),
                };
                let mut points = Vec::with_capacity(n.min(self.remaining() / 16));
                for _ in 0..n {
                    points.push(XyPoint::new(self.f64()?, self.f64()?));
                }
                TraciValue::Polygon(points)
            }
            TYPE_UBYTE      => TraciValue::Ubyte(self.u8()?),
            TYPE_INTEGER    => TraciValue::Int(self.i32()?),
            TYPE_DOUBLE     => TraciValue::Double(self.f64()?),
            TYPE_STRING     => TraciValue::String(self.string()?),
            TYPE_STRINGLIST => TraciValue::StringList(self.string_list()?),
            other => {
                return Err(SimError::simulation(format!("unsupported TraCI value type 0x{other:02x}")));
            }
        })
    }

    /// Consume the status command for request `expected` and fail on a
    /// non-OK result.
    pub fn status(&mut self, expected: u8) -> SimResult<()> {
        let (id, mut body) = self.command()?;
        if id != expected {
            return Err(SimError::simulation(format!(
                "TraCI status for command 0x{id:02x}, expected 0x{expected:02x}"
            )));
        }
        let result = body.u8()?;
        let description = body.string()?;
        match result {
            RTYPE_OK => Ok(()),
            RTYPE_NOTIMPLEMENTED => Err(SimError::simulation(format!(
                "TraCI command 0x{id:02x} not implemented: {description}"
            ))),
            _ => Err(SimError::simulation(format!(
                "TraCI command 0x{id:02x} failed: {description}"
            ))),
        }
    }

    /// Decode the content of a subscription response command.
    pub fn subscription(response_id: u8, mut body: Decoder<'_>) -> SimResult<SubscriptionResponse> {
        let object_id = body.string()?;
        let count = body.u8()?;
        let mut vars = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            let var = body.u8()?;
            let status = body.u8()?;
            let value = body.value()?;
            let entry = if status == RTYPE_OK {
                Ok(value)
            } else {
                Err(match value {
                    TraciValue::String(msg) => msg,
                    other => format!("status 0x{status:02x} ({})", other.type_name()),
                })
            };
            vars.push((var, entry));
        }
        Ok(SubscriptionResponse { response_id, object_id, vars })
    }

    /// Decode the subscription responses that follow a step status: an
    /// `i32` count, then one command each.
    pub fn step_responses(&mut self) -> SimResult<Vec<SubscriptionResponse>> {
        let n = self.len()?;
        let mut out = Vec::new();
        for _ in 0..n {
            let (id, body) = self.command()?;
            out.push(Self::subscription(id, body)?);
        }
        Ok(out)
    }
}

// ── Transport ─────────────────────────────────────────────────────────────────

/// Write one framed message.
pub fn send<W: Write>(stream: &mut W, message: &[u8]) -> SimResult<()> {
    stream.write_all(message)?;
    stream.flush()?;
    Ok(())
}

/// Read one framed message and return its body (without the length prefix).
pub fn receive<R: Read>(stream: &mut R) -> SimResult<Vec<u8>> {
    let mut len = [0u8; 4];
    stream.read_exact(&mut len).map_err(|e| {
        SimError::simulation(format!("TraCI connection lost: {e}"))
    })?;
    let total = i32::from_be_bytes(len);
    let body_len = usize::try_from(total)
        .ok()
        .and_then(|t| t.checked_sub(4))
        .ok_or_else(|| SimError::simulation(format!("invalid TraCI message length {total}")))?;
    let mut body = vec![0u8; body_len];
    stream.read_exact(&mut body).map_err(|e| {
        SimError::simulation(format!("TraCI connection lost: {e}"))
    })?;
    Ok(body)
}

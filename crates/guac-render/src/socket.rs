//! The rendering socket: typed `send_*` helpers, one per wire opcode a
//! core or plugin emits, built over any [`InstructionSink`].

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use guac_hash::Surface;
use guac_util::GuacStatus;

use crate::cache::ImageCache;
use crate::error::SinkError;
use crate::layer::LayerId;
use crate::sink::InstructionSink;

/// A compositing operation, used by drawing opcodes (`rect`, `line`, `arc`,
/// ...) to select how source pixels combine with the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeMode(pub u8);

impl CompositeMode {
    /// `SRC` — replace destination pixels outright.
    pub const SRC: Self = Self(3);
    /// `OVER` — alpha-composite onto the destination.
    pub const OVER: Self = Self(14);
}

/// Wraps an [`InstructionSink`] with one strongly typed method per wire
/// opcode. Each method builds a full instruction and writes it through the
/// sink; string arguments are encoded as UTF-8 and count-prefixed by the
/// sink's writer, never by the caller.
pub struct RenderSocket<S> {
    sink: S,
    cache: ImageCache,
}

impl<S: InstructionSink> RenderSocket<S> {
    /// Wraps `sink`, with a fresh per-connection image cache.
    #[must_use]
    pub fn new(sink: S) -> Self {
        Self { sink, cache: ImageCache::new() }
    }

    /// Access to this socket's image cache, e.g. to free a buffer layer
    /// once a plugin is done referencing it.
    #[must_use]
    pub const fn cache(&self) -> &ImageCache {
        &self.cache
    }

    /// Forces buffered bytes to the transport.
    pub async fn flush(&self) -> Result<(), SinkError> {
        self.sink.flush().await
    }

    /// `args,<schema...>` — the plugin's positional argument schema, sent
    /// once a client has selected a protocol.
    pub async fn send_args(&self, schema: &[&str]) -> Result<(), SinkError> {
        self.sink.write_instruction("args", schema).await
    }

    /// `ready,<connection-id>` — handshake completed, the connection
    /// identifier is assigned.
    pub async fn send_ready(&self, connection_id: &str) -> Result<(), SinkError> {
        self.sink.write_instruction("ready", &[connection_id]).await
    }

    /// `sync,<timestamp>` — the heartbeat carrying a monotonic millisecond
    /// timestamp.
    pub async fn send_sync(&self, timestamp_ms: i64) -> Result<(), SinkError> {
        let ts = timestamp_ms.to_string();
        self.sink.write_instruction("sync", &[&ts]).await
    }

    /// `error,<message>,<status>` — a fatal protocol or plugin error,
    /// always followed by the connection closing.
    pub async fn send_error(&self, message: &str, status: GuacStatus) -> Result<(), SinkError> {
        self.sink.write_instruction("error", &[message, status.wire()]).await
    }

    /// `disconnect` — the server is closing the connection.
    pub async fn send_disconnect(&self) -> Result<(), SinkError> {
        self.sink.write_instruction("disconnect", &[]).await
    }

    /// `log,<message>` — a diagnostic message forwarded to the client's
    /// debug console, used by plugins rather than the core.
    pub async fn send_log(&self, message: &str) -> Result<(), SinkError> {
        self.sink.write_instruction("log", &[message]).await
    }

    /// `name,<name>` — sets the human-readable session name shown in the
    /// client UI.
    pub async fn send_name(&self, name: &str) -> Result<(), SinkError> {
        self.sink.write_instruction("name", &[name]).await
    }

    /// `size,<layer>,<w>,<h>` — declares or resizes a layer's dimensions.
    pub async fn send_size(&self, layer: LayerId, width: u32, height: u32) -> Result<(), SinkError> {
        let (layer, w, h) = (layer.to_string(), width.to_string(), height.to_string());
        self.sink.write_instruction("size", &[&layer, &w, &h]).await
    }

    /// `move,<layer>,<parent>,<x>,<y>,<z>` — reparents and repositions a
    /// layer.
    pub async fn send_move(
        &self,
        layer: LayerId,
        parent: LayerId,
        x: i32,
        y: i32,
        z: i32,
    ) -> Result<(), SinkError> {
        let (layer, parent, x, y, z) =
            (layer.to_string(), parent.to_string(), x.to_string(), y.to_string(), z.to_string());
        self.sink.write_instruction("move", &[&layer, &parent, &x, &y, &z]).await
    }

    /// `dispose,<layer>` — destroys a layer or buffer.
    pub async fn send_dispose(&self, layer: LayerId) -> Result<(), SinkError> {
        let layer = layer.to_string();
        self.sink.write_instruction("dispose", &[&layer]).await
    }

    /// `push,<layer>` / `pop,<layer>` — saves or restores a layer's clip
    /// state.
    pub async fn send_push(&self, layer: LayerId) -> Result<(), SinkError> {
        let layer = layer.to_string();
        self.sink.write_instruction("push", &[&layer]).await
    }

    /// See [`RenderSocket::send_push`].
    pub async fn send_pop(&self, layer: LayerId) -> Result<(), SinkError> {
        let layer = layer.to_string();
        self.sink.write_instruction("pop", &[&layer]).await
    }

    /// `reset,<layer>` — clears a layer's clipping path back to unbounded.
    pub async fn send_reset(&self, layer: LayerId) -> Result<(), SinkError> {
        let layer = layer.to_string();
        self.sink.write_instruction("reset", &[&layer]).await
    }

    /// `rect,<layer>,<x>,<y>,<w>,<h>` — defines a rectangular clipping or
    /// fill path.
    pub async fn send_rect(
        &self,
        layer: LayerId,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    ) -> Result<(), SinkError> {
        let (layer, x, y, w, h) =
            (layer.to_string(), x.to_string(), y.to_string(), width.to_string(), height.to_string());
        self.sink.write_instruction("rect", &[&layer, &x, &y, &w, &h]).await
    }

    /// `line,<layer>,<x>,<y>` — appends a line segment to the current path.
    pub async fn send_line(&self, layer: LayerId, x: i32, y: i32) -> Result<(), SinkError> {
        let (layer, x, y) = (layer.to_string(), x.to_string(), y.to_string());
        self.sink.write_instruction("line", &[&layer, &x, &y]).await
    }

    /// `arc,<layer>,<x>,<y>,<radius>,<start>,<end>,<sweep>` — appends an
    /// arc segment to the current path.
    #[allow(clippy::too_many_arguments)]
    pub async fn send_arc(
        &self,
        layer: LayerId,
        x: i32,
        y: i32,
        radius: u32,
        start_radians: f64,
        end_radians: f64,
        negative_sweep: bool,
    ) -> Result<(), SinkError> {
        let (layer, x, y, r, s, e, neg) = (
            layer.to_string(),
            x.to_string(),
            y.to_string(),
            radius.to_string(),
            start_radians.to_string(),
            end_radians.to_string(),
            i32::from(negative_sweep).to_string(),
        );
        self.sink.write_instruction("arc", &[&layer, &x, &y, &r, &s, &e, &neg]).await
    }

    /// `curve,<layer>,<cp1x>,<cp1y>,<cp2x>,<cp2y>,<x>,<y>` — appends a cubic
    /// Bezier segment to the current path.
    #[allow(clippy::too_many_arguments)]
    pub async fn send_curve(
        &self,
        layer: LayerId,
        cp1x: i32,
        cp1y: i32,
        cp2x: i32,
        cp2y: i32,
        x: i32,
        y: i32,
    ) -> Result<(), SinkError> {
        let args =
            [cp1x, cp1y, cp2x, cp2y, x, y].map(|v| v.to_string());
        let layer = layer.to_string();
        self.sink
            .write_instruction(
                "curve",
                &[&layer, &args[0], &args[1], &args[2], &args[3], &args[4], &args[5]],
            )
            .await
    }

    /// `close,<layer>` — closes the current path.
    pub async fn send_close(&self, layer: LayerId) -> Result<(), SinkError> {
        let layer = layer.to_string();
        self.sink.write_instruction("close", &[&layer]).await
    }

    /// `fill,<layer>,<mask>,<r>,<g>,<b>,<a>` — fills the current path with
    /// a solid color.
    pub async fn send_fill(
        &self,
        layer: LayerId,
        mask: CompositeMode,
        r: u8,
        g: u8,
        b: u8,
        a: u8,
    ) -> Result<(), SinkError> {
        let (layer, mask, r, g, b, a) = (
            layer.to_string(),
            mask.0.to_string(),
            r.to_string(),
            g.to_string(),
            b.to_string(),
            a.to_string(),
        );
        self.sink.write_instruction("fill", &[&layer, &mask, &r, &g, &b, &a]).await
    }

    /// `stroke,<layer>,<mask>,<cap>,<join>,<thickness>,<r>,<g>,<b>,<a>` —
    /// strokes the current path.
    #[allow(clippy::too_many_arguments)]
    pub async fn send_stroke(
        &self,
        layer: LayerId,
        mask: CompositeMode,
        cap: u8,
        join: u8,
        thickness: u32,
        r: u8,
        g: u8,
        b: u8,
        a: u8,
    ) -> Result<(), SinkError> {
        let (layer, mask, cap, join, thickness, r, g, b, a) = (
            layer.to_string(),
            mask.0.to_string(),
            cap.to_string(),
            join.to_string(),
            thickness.to_string(),
            r.to_string(),
            g.to_string(),
            b.to_string(),
            a.to_string(),
        );
        self.sink
            .write_instruction("stroke", &[&layer, &mask, &cap, &join, &thickness, &r, &g, &b, &a])
            .await
    }

    /// `cfill,<mask>,<layer>,<r>,<g>,<b>,<a>` — fills with a color sourced
    /// from a compositing layer rather than the current path owner.
    pub async fn send_cfill(
        &self,
        mask: CompositeMode,
        layer: LayerId,
        r: u8,
        g: u8,
        b: u8,
        a: u8,
    ) -> Result<(), SinkError> {
        let (mask, layer, r, g, b, a) = (
            mask.0.to_string(),
            layer.to_string(),
            r.to_string(),
            g.to_string(),
            b.to_string(),
            a.to_string(),
        );
        self.sink.write_instruction("cfill", &[&mask, &layer, &r, &g, &b, &a]).await
    }

    /// `cstroke,<mask>,<layer>,<cap>,<join>,<thickness>,<r>,<g>,<b>,<a>`.
    #[allow(clippy::too_many_arguments)]
    pub async fn send_cstroke(
        &self,
        mask: CompositeMode,
        layer: LayerId,
        cap: u8,
        join: u8,
        thickness: u32,
        r: u8,
        g: u8,
        b: u8,
        a: u8,
    ) -> Result<(), SinkError> {
        let (mask, layer, cap, join, thickness, r, g, b, a) = (
            mask.0.to_string(),
            layer.to_string(),
            cap.to_string(),
            join.to_string(),
            thickness.to_string(),
            r.to_string(),
            g.to_string(),
            b.to_string(),
            a.to_string(),
        );
        self.sink
            .write_instruction(
                "cstroke",
                &[&mask, &layer, &cap, &join, &thickness, &r, &g, &b, &a],
            )
            .await
    }

    /// `transform,<layer>,<a>,<b>,<c>,<d>,<e>,<f>` — applies an affine
    /// transform matrix to a layer.
    #[allow(clippy::too_many_arguments)]
    pub async fn send_transform(
        &self,
        layer: LayerId,
        a: f64,
        b: f64,
        c: f64,
        d: f64,
        e: f64,
        f: f64,
    ) -> Result<(), SinkError> {
        let layer = layer.to_string();
        let nums = [a, b, c, d, e, f].map(|v| v.to_string());
        self.sink
            .write_instruction(
                "transform",
                &[&layer, &nums[0], &nums[1], &nums[2], &nums[3], &nums[4], &nums[5]],
            )
            .await
    }

    /// `distort,<layer>,<a>,<b>,<c>,<d>,<e>,<f>` — like `transform`, but
    /// applied to the layer's pending content rather than committed state.
    #[allow(clippy::too_many_arguments)]
    pub async fn send_distort(
        &self,
        layer: LayerId,
        a: f64,
        b: f64,
        c: f64,
        d: f64,
        e: f64,
        f: f64,
    ) -> Result<(), SinkError> {
        let layer = layer.to_string();
        let nums = [a, b, c, d, e, f].map(|v| v.to_string());
        self.sink
            .write_instruction(
                "distort",
                &[&layer, &nums[0], &nums[1], &nums[2], &nums[3], &nums[4], &nums[5]],
            )
            .await
    }

    /// `set,<layer>,<name>,<value>` — sets a layer property (e.g. an
    /// opacity or filter hint).
    pub async fn send_set(&self, layer: LayerId, name: &str, value: &str) -> Result<(), SinkError> {
        let layer = layer.to_string();
        self.sink.write_instruction("set", &[&layer, name, value]).await
    }

    /// `shade,<layer>,<a>` — sets a layer's overall alpha multiplier.
    pub async fn send_shade(&self, layer: LayerId, alpha: u8) -> Result<(), SinkError> {
        let (layer, a) = (layer.to_string(), alpha.to_string());
        self.sink.write_instruction("shade", &[&layer, &a]).await
    }

    /// `copy,<src-layer>,<sx>,<sy>,<w>,<h>,<mask>,<dst-layer>,<dx>,<dy>` —
    /// copies a rectangle between layers without re-sending pixel data.
    #[allow(clippy::too_many_arguments)]
    pub async fn send_copy(
        &self,
        src_layer: LayerId,
        sx: i32,
        sy: i32,
        width: u32,
        height: u32,
        mask: CompositeMode,
        dst_layer: LayerId,
        dx: i32,
        dy: i32,
    ) -> Result<(), SinkError> {
        let (src, sx, sy, w, h, mask, dst, dx, dy) = (
            src_layer.to_string(),
            sx.to_string(),
            sy.to_string(),
            width.to_string(),
            height.to_string(),
            mask.0.to_string(),
            dst_layer.to_string(),
            dx.to_string(),
            dy.to_string(),
        );
        self.sink.write_instruction("copy", &[&src, &sx, &sy, &w, &h, &mask, &dst, &dx, &dy]).await
    }

    /// `transfer,<src-layer>,<sx>,<sy>,<w>,<h>,<fn>,<dst-layer>,<dx>,<dy>` —
    /// like `copy`, but combines pixels with a bitwise transfer function
    /// instead of alpha compositing.
    #[allow(clippy::too_many_arguments)]
    pub async fn send_transfer(
        &self,
        src_layer: LayerId,
        sx: i32,
        sy: i32,
        width: u32,
        height: u32,
        transfer_fn: u8,
        dst_layer: LayerId,
        dx: i32,
        dy: i32,
    ) -> Result<(), SinkError> {
        let (src, sx, sy, w, h, func, dst, dx, dy) = (
            src_layer.to_string(),
            sx.to_string(),
            sy.to_string(),
            width.to_string(),
            height.to_string(),
            transfer_fn.to_string(),
            dst_layer.to_string(),
            dx.to_string(),
            dy.to_string(),
        );
        self.sink
            .write_instruction("transfer", &[&src, &sx, &sy, &w, &h, &func, &dst, &dx, &dy])
            .await
    }

    /// `cursor,<x>,<y>,<layer>,<sx>,<sy>,<w>,<h>` — sets the mouse cursor
    /// hotspot and appearance from a source rectangle.
    #[allow(clippy::too_many_arguments)]
    pub async fn send_cursor(
        &self,
        x: i32,
        y: i32,
        source_layer: LayerId,
        sx: i32,
        sy: i32,
        width: u32,
        height: u32,
    ) -> Result<(), SinkError> {
        let (x, y, layer, sx, sy, w, h) = (
            x.to_string(),
            y.to_string(),
            source_layer.to_string(),
            sx.to_string(),
            sy.to_string(),
            width.to_string(),
            height.to_string(),
        );
        self.sink.write_instruction("cursor", &[&x, &y, &layer, &sx, &sy, &w, &h]).await
    }

    /// `audio,<stream>,<mimetype>` — opens an audio output stream on the
    /// given layer-addressable stream index.
    pub async fn send_audio(&self, stream: u32, mimetype: &str) -> Result<(), SinkError> {
        let stream = stream.to_string();
        self.sink.write_instruction("audio", &[&stream, mimetype]).await
    }

    /// `file,<stream>,<mimetype>,<name>` — opens an inbound or outbound
    /// file transfer stream.
    pub async fn send_file(&self, stream: u32, mimetype: &str, name: &str) -> Result<(), SinkError> {
        let stream = stream.to_string();
        self.sink.write_instruction("file", &[&stream, mimetype, name]).await
    }

    /// `pipe,<stream>,<mimetype>,<name>` — opens a named, bidirectional
    /// pipe stream.
    pub async fn send_pipe(&self, stream: u32, mimetype: &str, name: &str) -> Result<(), SinkError> {
        let stream = stream.to_string();
        self.sink.write_instruction("pipe", &[&stream, mimetype, name]).await
    }

    /// `clipboard,<stream>,<mimetype>` — announces clipboard data
    /// incoming on a stream.
    pub async fn send_clipboard(&self, stream: u32, mimetype: &str) -> Result<(), SinkError> {
        let stream = stream.to_string();
        self.sink.write_instruction("clipboard", &[&stream, mimetype]).await
    }

    /// `blob,<stream>,<base64-data>` — a chunk of stream payload, base64
    /// encoded per the wire protocol's binary-safety requirement.
    pub async fn send_blob(&self, stream: u32, data: &[u8]) -> Result<(), SinkError> {
        let stream = stream.to_string();
        let encoded = STANDARD.encode(data);
        self.sink.write_instruction("blob", &[&stream, &encoded]).await
    }

    /// `end,<stream>` — closes a stream opened by `audio`, `file`, `pipe`,
    /// `clipboard`, or `img`.
    pub async fn send_end(&self, stream: u32) -> Result<(), SinkError> {
        let stream = stream.to_string();
        self.sink.write_instruction("end", &[&stream]).await
    }

    /// `img,<stream>,<mask>,<layer>,<mimetype>,<x>,<y>` — opens an image
    /// stream; the caller must follow with `blob`/`end` carrying the
    /// encoded image bytes.
    #[allow(clippy::too_many_arguments)]
    pub async fn send_img(
        &self,
        stream: u32,
        mask: CompositeMode,
        layer: LayerId,
        mimetype: &str,
        x: i32,
        y: i32,
    ) -> Result<(), SinkError> {
        let (stream, mask, layer, x, y) =
            (stream.to_string(), mask.0.to_string(), layer.to_string(), x.to_string(), y.to_string());
        self.sink.write_instruction("img", &[&stream, &mask, &layer, mimetype, &x, &y]).await
    }

    /// Runs the full image pipeline (spec §4.2) for one rectangle: probe
    /// the cache, and on a confirmed hit emit a `copy` from the cached
    /// buffer instead of re-sending pixels; on a miss, send the image
    /// stream (`img`/`blob`/`end`) and register the rectangle in the cache
    /// under `fresh_buffer`.
    ///
    /// `encoded` is the already-encoded image payload (PNG/JPEG/WebP
    /// bytes) a protocol plugin produced for `pixels`; this socket does
    /// not perform image encoding itself. `fresh_buffer` is a buffer layer
    /// the caller has already allocated from the client's shared buffer
    /// pool, to be used only if this call turns out to be a cache miss;
    /// on a hit, `fresh_buffer` is left untouched for the caller to free
    /// or reuse.
    #[allow(clippy::too_many_arguments)]
    pub async fn send_image(
        &self,
        stream: u32,
        mask: CompositeMode,
        layer: LayerId,
        mimetype: &str,
        x: i32,
        y: i32,
        pixels: &Surface<'_>,
        encoded: &[u8],
        fresh_buffer: LayerId,
    ) -> Result<(), SinkError> {
        let width = u32::try_from(pixels.width()).unwrap_or(u32::MAX);
        let height = u32::try_from(pixels.height()).unwrap_or(u32::MAX);

        if let Some(cached) = self.cache.probe(pixels) {
            return self.send_copy(cached, 0, 0, width, height, mask, layer, x, y).await;
        }

        self.send_img(stream, mask, layer, mimetype, x, y).await?;
        self.send_blob(stream, encoded).await?;
        self.send_end(stream).await?;

        self.send_copy(layer, x, y, width, height, CompositeMode::SRC, fresh_buffer, 0, 0).await?;
        self.cache.insert(pixels, fresh_buffer);
        Ok(())
    }
}

use std::fmt;
use std::sync::mpsc;

use bytemuck::{Pod, Zeroable};

use crate::field::ViewportBounds;

/// Uniform parameter block, rewritten on every dispatch.
/// Padded to 32 bytes for WGSL uniform layout.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct PatternParams {
    width: u32,
    height: u32,
    time: f32,
    complexity: f32,
    offset_x: i32,
    offset_y: i32,
    _pad: [u32; 2],
}

/// Dispatch lifecycle: Idle → Dispatching → AwaitingReadback → Idle.
/// At most one dispatch is ever in flight; there is no queue and no
/// cancellation — stale results are discarded by the cache instead.
enum DispatchState {
    Idle,
    Dispatching,
    AwaitingReadback {
        bounds: ViewportBounds,
        time: f32,
        rx: mpsc::Receiver<Result<(), wgpu::BufferAsyncError>>,
    },
}

/// Outcome of draining the single-slot readback channel.
pub enum ReadbackPoll {
    /// Nothing dispatched.
    Idle,
    /// Dispatch in flight, device not done yet.
    Pending,
    /// A field arrived. The cache decides whether its bounds are still wanted.
    Ready {
        bounds: ViewportBounds,
        time: f32,
        values: Vec<f32>,
    },
    /// The device failed; the engine must downgrade to scalar-only.
    Failed,
}

/// Why a dispatch was refused outright.
#[derive(Debug)]
pub enum GpuError {
    FieldTooLarge { required: u64, limit: u64 },
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::FieldTooLarge { required, limit } => {
                write!(f, "field buffer of {required} bytes exceeds device limit {limit}")
            }
        }
    }
}

/// wgpu compute evaluator for the pattern field.
///
/// All device handles are exclusively owned by this instance — no process-wide
/// state — and are torn down with it. Construction is fallible; the engine
/// runs scalar-only when no usable adapter exists.
pub struct GpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    params_buffer: wgpu::Buffer,
    /// Device-side field storage, `width * height * 4` bytes. Reallocated only
    /// when the required size changes.
    field_buffer: Option<wgpu::Buffer>,
    staging_buffer: Option<wgpu::Buffer>,
    bind_group: Option<wgpu::BindGroup>,
    capacity: u64,
    max_field_bytes: u64,
    state: DispatchState,
}

impl GpuBackend {
    /// Acquire an adapter and build the compute pipeline. Returns None (with a
    /// log line) when no device is usable; callers never retry.
    pub fn new() -> Option<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let adapter = match pollster::block_on(instance.request_adapter(
            &wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            },
        )) {
            Ok(adapter) => adapter,
            Err(e) => {
                log::warn!("no GPU adapter for pattern compute ({e}); running scalar-only");
                return None;
            }
        };

        log::info!(
            "Pattern compute adapter: {:?} ({:?})",
            adapter.get_info().name,
            adapter.get_info().backend
        );

        let (device, queue) = match pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("pattern_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            },
        )) {
            Ok(pair) => pair,
            Err(e) => {
                log::warn!("GPU device request failed ({e}); running scalar-only");
                return None;
            }
        };

        let max_field_bytes = device.limits().max_storage_buffer_binding_size as u64;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("pattern_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/pattern.wgsl").into()),
        });

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("pattern_bind_layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: false },
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                ],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pattern_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("pattern_pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("pattern_params"),
            size: std::mem::size_of::<PatternParams>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        log::info!("pattern compute pipeline initialized");

        Some(Self {
            device,
            queue,
            pipeline,
            bind_group_layout,
            params_buffer,
            field_buffer: None,
            staging_buffer: None,
            bind_group: None,
            capacity: 0,
            max_field_bytes,
            state: DispatchState::Idle,
        })
    }

    pub fn is_busy(&self) -> bool {
        !matches!(self.state, DispatchState::Idle)
    }

    /// Recreate field/staging buffers when the required size changes.
    fn ensure_capacity(&mut self, bytes: u64) {
        if self.capacity == bytes && self.field_buffer.is_some() {
            return;
        }

        let field_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("pattern_field_buffer"),
            size: bytes,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let staging_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("pattern_staging_buffer"),
            size: bytes,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("pattern_bind_group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: field_buffer.as_entire_binding(),
                },
            ],
        });

        self.field_buffer = Some(field_buffer);
        self.staging_buffer = Some(staging_buffer);
        self.bind_group = Some(bind_group);
        self.capacity = bytes;
    }

    /// Submit one asynchronous evaluation. No-op while a dispatch is in
    /// flight (the cache re-requests next frame; latest bounds win).
    pub fn dispatch(
        &mut self,
        bounds: ViewportBounds,
        time: f32,
        complexity: f32,
    ) -> Result<(), GpuError> {
        if self.is_busy() || bounds.is_empty() {
            return Ok(());
        }

        let width = bounds.width();
        let height = bounds.height();
        let bytes = width as u64 * height as u64 * 4;
        if bytes > self.max_field_bytes {
            return Err(GpuError::FieldTooLarge {
                required: bytes,
                limit: self.max_field_bytes,
            });
        }

        self.state = DispatchState::Dispatching;
        self.ensure_capacity(bytes);

        let params = PatternParams {
            width,
            height,
            time,
            complexity,
            offset_x: bounds.min_x,
            offset_y: bounds.min_y,
            _pad: [0; 2],
        };
        self.queue
            .write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));

        // is_busy() above guarantees these were built by ensure_capacity.
        let (field_buffer, staging_buffer, bind_group) = match (
            &self.field_buffer,
            &self.staging_buffer,
            &self.bind_group,
        ) {
            (Some(f), Some(s), Some(b)) => (f, s, b),
            _ => {
                self.state = DispatchState::Idle;
                return Ok(());
            }
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("pattern_encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("pattern_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.dispatch_workgroups(width.div_ceil(8), height.div_ceil(8), 1);
        }
        encoder.copy_buffer_to_buffer(field_buffer, 0, staging_buffer, 0, bytes);
        self.queue.submit(std::iter::once(encoder.finish()));

        // Single-slot result channel: the map callback signals, the next
        // synchronous frame drains it via poll().
        let (tx, rx) = mpsc::channel();
        staging_buffer
            .slice(..)
            .map_async(wgpu::MapMode::Read, move |result| {
                let _ = tx.send(result);
            });

        self.state = DispatchState::AwaitingReadback { bounds, time, rx };
        Ok(())
    }

    /// Drain the readback slot without blocking.
    pub fn poll(&mut self) -> ReadbackPoll {
        let state = std::mem::replace(&mut self.state, DispatchState::Idle);
        let (bounds, time, rx) = match state {
            DispatchState::Idle => return ReadbackPoll::Idle,
            DispatchState::Dispatching => {
                self.state = DispatchState::Dispatching;
                return ReadbackPoll::Pending;
            }
            DispatchState::AwaitingReadback { bounds, time, rx } => (bounds, time, rx),
        };

        if self.device.poll(wgpu::PollType::Poll).is_err() {
            log::error!("GPU poll failed awaiting pattern readback");
            return ReadbackPoll::Failed;
        }

        match rx.try_recv() {
            Ok(Ok(())) => {
                let staging = match &self.staging_buffer {
                    Some(s) => s,
                    None => return ReadbackPoll::Failed,
                };
                let values = {
                    let data = staging.slice(..).get_mapped_range();
                    bytemuck::pod_collect_to_vec::<u8, f32>(&data[..])
                };
                staging.unmap();
                ReadbackPoll::Ready {
                    bounds,
                    time,
                    values,
                }
            }
            Ok(Err(e)) => {
                log::error!("pattern readback mapping failed: {e}");
                ReadbackPoll::Failed
            }
            Err(mpsc::TryRecvError::Empty) => {
                self.state = DispatchState::AwaitingReadback { bounds, time, rx };
                ReadbackPoll::Pending
            }
            Err(mpsc::TryRecvError::Disconnected) => {
                log::error!("pattern readback channel lost");
                ReadbackPoll::Failed
            }
        }
    }
}

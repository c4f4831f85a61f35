//! HailoRT device bound at runtime through `libhailort`.
//!
//! Only the handful of C entry points the benchmark needs are resolved: one
//! virtual device, one HEF, one network group, and the blocking `hailo_infer`
//! call over all of its virtual streams.

use std::{
    ffi::{CString, c_char, c_void},
    os::unix::ffi::OsStrExt,
    path::{Path, PathBuf},
    ptr,
    time::Duration,
};

use libloading::os::unix::{Library, RTLD_GLOBAL, RTLD_NOW};
use tracing::{debug, info, warn};

use crate::{accelerator::AcceleratorDevice, backend::BackendError};

const LIBRARY_CANDIDATES: [&str; 2] = ["libhailort.so", "libhailort.so.4"];

const HAILO_SUCCESS: i32 = 0;
const HAILO_TIMEOUT: i32 = 4;

const MAX_STREAM_NAME_SIZE: usize = 128;
const MAX_NETWORK_NAME_SIZE: usize = 257;
const MAX_VSTREAMS: usize = 16;

const FORMAT_TYPE_UINT8: u32 = 1;
const FORMAT_TYPE_FLOAT32: u32 = 3;

type Handle = *mut c_void;

#[repr(C)]
#[derive(Clone, Copy)]
struct HailoFormat {
    kind: u32,
    order: u32,
    flags: u32,
}

#[repr(C)]
#[derive(Clone, Copy)]
struct VStreamParams {
    user_buffer_format: HailoFormat,
    timeout_ms: u32,
    queue_size: u32,
    vstream_stats_flags: u32,
    pipeline_elements_stats_flags: u32,
}

#[repr(C)]
#[derive(Clone, Copy)]
struct VStreamParamsByName {
    name: [c_char; MAX_STREAM_NAME_SIZE],
    params: VStreamParams,
}

#[repr(C)]
#[derive(Clone, Copy)]
struct RawBufferByName {
    name: [c_char; MAX_STREAM_NAME_SIZE],
    buffer: *mut c_void,
    size: usize,
}

#[repr(C)]
#[derive(Clone, Copy)]
struct ImageShape {
    height: u32,
    width: u32,
    features: u32,
}

#[repr(C)]
#[derive(Clone, Copy)]
union StreamShape {
    image: ImageShape,
    nms: [u32; 4],
}

#[repr(C)]
#[derive(Clone, Copy)]
struct VStreamInfo {
    name: [c_char; MAX_STREAM_NAME_SIZE],
    network_name: [c_char; MAX_NETWORK_NAME_SIZE],
    direction: u32,
    format: HailoFormat,
    shape: StreamShape,
    quant_info: [f32; 4],
}

impl VStreamInfo {
    fn zeroed() -> Self {
        Self {
            name: [0; MAX_STREAM_NAME_SIZE],
            network_name: [0; MAX_NETWORK_NAME_SIZE],
            direction: 0,
            format: HailoFormat {
                kind: 0,
                order: 0,
                flags: 0,
            },
            shape: StreamShape { nms: [0; 4] },
            quant_info: [0.0; 4],
        }
    }
}

impl VStreamParamsByName {
    fn zeroed() -> Self {
        Self {
            name: [0; MAX_STREAM_NAME_SIZE],
            params: VStreamParams {
                user_buffer_format: HailoFormat {
                    kind: 0,
                    order: 0,
                    flags: 0,
                },
                timeout_ms: 0,
                queue_size: 0,
                vstream_stats_flags: 0,
                pipeline_elements_stats_flags: 0,
            },
        }
    }
}

type CreateVDevice = unsafe extern "C" fn(*const c_void, *mut Handle) -> i32;
type ReleaseHandle = unsafe extern "C" fn(Handle) -> i32;
type CreateHefFile = unsafe extern "C" fn(*mut Handle, *const c_char) -> i32;
type ConfigureVDevice =
    unsafe extern "C" fn(Handle, Handle, *const c_void, *mut Handle, *mut usize) -> i32;
type ActivateNetworkGroup = unsafe extern "C" fn(Handle, *const c_void, *mut Handle) -> i32;
type MakeVStreamParams =
    unsafe extern "C" fn(Handle, bool, u32, *mut VStreamParamsByName, *mut usize) -> i32;
type GetVStreamInfos =
    unsafe extern "C" fn(Handle, *const c_char, *mut VStreamInfo, *mut usize) -> i32;
type GetVStreamFrameSize =
    unsafe extern "C" fn(*const VStreamInfo, *const HailoFormat, *mut usize) -> i32;
type Infer = unsafe extern "C" fn(
    Handle,
    *mut VStreamParamsByName,
    *mut RawBufferByName,
    usize,
    *mut VStreamParamsByName,
    *mut RawBufferByName,
    usize,
    usize,
) -> i32;

/// Function table resolved from `libhailort`. The library handle is kept
/// alive for as long as the pointers are.
struct HailoApi {
    _library: Library,
    create_vdevice: CreateVDevice,
    release_vdevice: ReleaseHandle,
    create_hef_file: CreateHefFile,
    release_hef: ReleaseHandle,
    configure_vdevice: ConfigureVDevice,
    activate_network_group: ActivateNetworkGroup,
    deactivate_network_group: ReleaseHandle,
    make_input_vstream_params: MakeVStreamParams,
    make_output_vstream_params: MakeVStreamParams,
    input_vstream_infos: GetVStreamInfos,
    output_vstream_infos: GetVStreamInfos,
    vstream_frame_size: GetVStreamFrameSize,
    infer: Infer,
}

impl HailoApi {
    fn load() -> Result<Self, BackendError> {
        let mut last_error = String::from("no candidate library");
        for name in LIBRARY_CANDIDATES {
            match unsafe { Library::open(Some(name), RTLD_NOW | RTLD_GLOBAL) } {
                Ok(library) => {
                    debug!("loaded {name}");
                    return Self::resolve(library);
                }
                Err(err) => {
                    debug!("failed to load {name}: {err}");
                    last_error = err.to_string();
                }
            }
        }
        Err(BackendError::Runtime(last_error))
    }

    fn resolve(library: Library) -> Result<Self, BackendError> {
        macro_rules! symbol {
            ($name:literal, $ty:ty) => {
                // SAFETY: the declared signature matches the HailoRT 4.x C header.
                *unsafe { library.get::<$ty>(concat!($name, "\0").as_bytes()) }
                    .map_err(|e| BackendError::Runtime(format!("{}: {e}", $name)))?
            };
        }

        Ok(Self {
            create_vdevice: symbol!("hailo_create_vdevice", CreateVDevice),
            release_vdevice: symbol!("hailo_release_vdevice", ReleaseHandle),
            create_hef_file: symbol!("hailo_create_hef_file", CreateHefFile),
            release_hef: symbol!("hailo_release_hef", ReleaseHandle),
            configure_vdevice: symbol!("hailo_configure_vdevice", ConfigureVDevice),
            activate_network_group: symbol!("hailo_activate_network_group", ActivateNetworkGroup),
            deactivate_network_group: symbol!("hailo_deactivate_network_group", ReleaseHandle),
            make_input_vstream_params: symbol!("hailo_make_input_vstream_params", MakeVStreamParams),
            make_output_vstream_params: symbol!("hailo_make_output_vstream_params", MakeVStreamParams),
            input_vstream_infos: symbol!("hailo_network_group_get_input_vstream_infos", GetVStreamInfos),
            output_vstream_infos: symbol!("hailo_network_group_get_output_vstream_infos", GetVStreamInfos),
            vstream_frame_size: symbol!("hailo_get_vstream_frame_size", GetVStreamFrameSize),
            infer: symbol!("hailo_infer", Infer),
            _library: library,
        })
    }
}

fn check(call: &'static str, status: i32) -> Result<(), BackendError> {
    if status == HAILO_SUCCESS {
        Ok(())
    } else {
        Err(BackendError::Status { call, status })
    }
}

/// One Hailo virtual device running a single compiled HEF model.
pub struct HailoDevice {
    api: HailoApi,
    hef_path: PathBuf,
    vdevice: Handle,
    hef: Handle,
    network_group: Handle,
    activated: Handle,
    input_params: Vec<VStreamParamsByName>,
    output_params: Vec<VStreamParamsByName>,
    output_buffers: Vec<Vec<u8>>,
    input_size: (u32, u32),
    input_frame_len: usize,
}

// SAFETY: the handles are only touched through `&mut self`, and HailoRT
// allows a vdevice to be driven from any single thread at a time.
unsafe impl Send for HailoDevice {}

impl HailoDevice {
    /// Bind the runtime library for the model at `hef_path`. Nothing is
    /// created on the device until [`AcceleratorDevice::configure`].
    pub fn open(hef_path: impl AsRef<Path>) -> Result<Self, BackendError> {
        let hef_path = hef_path.as_ref().to_path_buf();
        if !hef_path.is_file() {
            return Err(BackendError::ModelNotFound(hef_path));
        }
        let api = HailoApi::load()?;
        Ok(Self {
            api,
            hef_path,
            vdevice: ptr::null_mut(),
            hef: ptr::null_mut(),
            network_group: ptr::null_mut(),
            activated: ptr::null_mut(),
            input_params: Vec::new(),
            output_params: Vec::new(),
            output_buffers: Vec::new(),
            input_size: (0, 0),
            input_frame_len: 0,
        })
    }

    fn make_params(
        &self,
        make: MakeVStreamParams,
        call: &'static str,
        format_type: u32,
    ) -> Result<Vec<VStreamParamsByName>, BackendError> {
        let mut params = vec![VStreamParamsByName::zeroed(); MAX_VSTREAMS];
        let mut count = params.len();
        check(call, unsafe {
            make(
                self.network_group,
                false,
                format_type,
                params.as_mut_ptr(),
                &mut count,
            )
        })?;
        params.truncate(count);
        Ok(params)
    }

    fn stream_infos(
        &self,
        get: GetVStreamInfos,
        call: &'static str,
    ) -> Result<Vec<VStreamInfo>, BackendError> {
        let mut infos = vec![VStreamInfo::zeroed(); MAX_VSTREAMS];
        let mut count = infos.len();
        check(call, unsafe {
            get(
                self.network_group,
                ptr::null(),
                infos.as_mut_ptr(),
                &mut count,
            )
        })?;
        infos.truncate(count);
        Ok(infos)
    }

    fn release(&mut self) {
        if !self.activated.is_null() {
            let status = unsafe { (self.api.deactivate_network_group)(self.activated) };
            if status != HAILO_SUCCESS {
                warn!("hailo_deactivate_network_group returned status {status}");
            }
            self.activated = ptr::null_mut();
        }
        if !self.hef.is_null() {
            unsafe { (self.api.release_hef)(self.hef) };
            self.hef = ptr::null_mut();
        }
        if !self.vdevice.is_null() {
            unsafe { (self.api.release_vdevice)(self.vdevice) };
            self.vdevice = ptr::null_mut();
        }
        self.network_group = ptr::null_mut();
    }
}

impl AcceleratorDevice for HailoDevice {
    fn configure(&mut self) -> Result<(), BackendError> {
        check("hailo_create_vdevice", unsafe {
            (self.api.create_vdevice)(ptr::null(), &mut self.vdevice)
        })?;

        let path = CString::new(self.hef_path.as_os_str().as_bytes())
            .map_err(|e| BackendError::Load(e.to_string()))?;
        check("hailo_create_hef_file", unsafe {
            (self.api.create_hef_file)(&mut self.hef, path.as_ptr())
        })
        .map_err(|e| BackendError::Load(format!("{}: {e}", self.hef_path.display())))?;

        let mut groups: [Handle; 1] = [ptr::null_mut()];
        let mut group_count = groups.len();
        check("hailo_configure_vdevice", unsafe {
            (self.api.configure_vdevice)(
                self.vdevice,
                self.hef,
                ptr::null(),
                groups.as_mut_ptr(),
                &mut group_count,
            )
        })?;
        if group_count == 0 {
            return Err(BackendError::Load("HEF contains no network group".into()));
        }
        self.network_group = groups[0];

        self.input_params = self.make_params(
            self.api.make_input_vstream_params,
            "hailo_make_input_vstream_params",
            FORMAT_TYPE_UINT8,
        )?;
        self.output_params = self.make_params(
            self.api.make_output_vstream_params,
            "hailo_make_output_vstream_params",
            FORMAT_TYPE_FLOAT32,
        )?;
        if self.input_params.len() != 1 {
            return Err(BackendError::Load(format!(
                "expected a single input stream, model has {}",
                self.input_params.len()
            )));
        }

        let inputs = self.stream_infos(
            self.api.input_vstream_infos,
            "hailo_network_group_get_input_vstream_infos",
        )?;
        let input = inputs
            .first()
            .ok_or_else(|| BackendError::Load("model has no input stream info".into()))?;
        // SAFETY: input streams always carry an image shape.
        let shape = unsafe { input.shape.image };
        self.input_size = (shape.width, shape.height);
        self.input_frame_len = (shape.width * shape.height * shape.features) as usize;

        let outputs = self.stream_infos(
            self.api.output_vstream_infos,
            "hailo_network_group_get_output_vstream_infos",
        )?;
        let mut buffers = Vec::with_capacity(self.output_params.len());
        for params in &self.output_params {
            let info = outputs
                .iter()
                .find(|info| info.name == params.name)
                .ok_or_else(|| BackendError::Load("output stream info missing".into()))?;
            let mut size = 0usize;
            check("hailo_get_vstream_frame_size", unsafe {
                (self.api.vstream_frame_size)(info, &params.params.user_buffer_format, &mut size)
            })?;
            buffers.push(vec![0u8; size]);
        }
        self.output_buffers = buffers;

        info!(
            "configured {} ({}x{}x{} input, {} outputs)",
            self.hef_path.display(),
            shape.width,
            shape.height,
            shape.features,
            self.output_buffers.len()
        );
        Ok(())
    }

    fn input_size(&self) -> (u32, u32) {
        self.input_size
    }

    fn activate(&mut self) -> Result<(), BackendError> {
        if !self.activated.is_null() {
            return Ok(());
        }
        check("hailo_activate_network_group", unsafe {
            (self.api.activate_network_group)(self.network_group, ptr::null(), &mut self.activated)
        })
    }

    fn deactivate(&mut self) -> Result<(), BackendError> {
        if self.activated.is_null() {
            return Ok(());
        }
        let status = unsafe { (self.api.deactivate_network_group)(self.activated) };
        self.activated = ptr::null_mut();
        check("hailo_deactivate_network_group", status)
    }

    fn infer(&mut self, input: &[u8], timeout: Duration) -> Result<usize, BackendError> {
        if input.len() != self.input_frame_len {
            return Err(BackendError::Inference(format!(
                "input frame is {} bytes, model expects {}",
                input.len(),
                self.input_frame_len
            )));
        }

        let timeout_ms = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX);
        for params in self.input_params.iter_mut().chain(&mut self.output_params) {
            params.params.timeout_ms = timeout_ms;
        }

        let mut input_buffers: Vec<RawBufferByName> = self
            .input_params
            .iter()
            .map(|params| RawBufferByName {
                name: params.name,
                // HailoRT never writes through input buffers.
                buffer: input.as_ptr() as *mut c_void,
                size: input.len(),
            })
            .collect();
        let mut output_buffers: Vec<RawBufferByName> = self
            .output_params
            .iter()
            .zip(self.output_buffers.iter_mut())
            .map(|(params, buffer)| RawBufferByName {
                name: params.name,
                buffer: buffer.as_mut_ptr().cast(),
                size: buffer.len(),
            })
            .collect();

        let status = unsafe {
            (self.api.infer)(
                self.network_group,
                self.input_params.as_mut_ptr(),
                input_buffers.as_mut_ptr(),
                input_buffers.len(),
                self.output_params.as_mut_ptr(),
                output_buffers.as_mut_ptr(),
                output_buffers.len(),
                1,
            )
        };
        match status {
            HAILO_SUCCESS => Ok(output_buffers.len()),
            HAILO_TIMEOUT => Err(BackendError::Timeout(timeout)),
            status => Err(BackendError::Status {
                call: "hailo_infer",
                status,
            }),
        }
    }
}

impl Drop for HailoDevice {
    fn drop(&mut self) {
        self.release();
    }
}

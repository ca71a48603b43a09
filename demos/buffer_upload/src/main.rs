use tvma::ash::{self, vk};
use tvma::vk_mem as vkm;

const UPLOAD_SIZE: usize = 64 * 1024;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Raw headless bring-up; tvma only takes over once the device exists.
    let entry = unsafe { ash::Entry::load()? };

    let app_info = vk::ApplicationInfo::default()
        .application_name(c"buffer_upload")
        .api_version(vk::API_VERSION_1_1);
    let instance_info = vk::InstanceCreateInfo::default().application_info(&app_info);
    let instance = unsafe { entry.create_instance(&instance_info, None)? };

    let adapters = unsafe { instance.enumerate_physical_devices()? };
    let pdevice = adapters[0];
    let properties = unsafe { instance.get_physical_device_properties(pdevice) };
    log::info!("adapter: {:?}", properties.device_name_as_c_str()?);

    let priorities = [1.0];
    let queue_info = vk::DeviceQueueCreateInfo::default()
        .queue_family_index(0)
        .queue_priorities(&priorities);
    let device_info =
        vk::DeviceCreateInfo::default().queue_create_infos(std::slice::from_ref(&queue_info));
    let device = unsafe { instance.create_device(pdevice, &device_info, None)? };

    let allocator = tvma::Allocator::new(
        vkm::AllocatorCreateInfo::new(&instance, &device, pdevice),
        &device,
    )?;

    let buffer_info = vk::BufferCreateInfo::default()
        .size(UPLOAD_SIZE as u64)
        .usage(vk::BufferUsageFlags::TRANSFER_SRC)
        .sharing_mode(vk::SharingMode::EXCLUSIVE);
    let create_info = vkm::AllocationCreateInfo {
        usage: vkm::MemoryUsage::AutoPreferHost,
        flags: vkm::AllocationCreateFlags::HOST_ACCESS_RANDOM,
        ..Default::default()
    };

    let (buffer, mut allocation) = allocator.create_buffer(&buffer_info, &create_info)?;
    log::info!("staging buffer created: {:?}", buffer.handle());

    let pattern: Vec<u8> = (0..UPLOAD_SIZE).map(|i| (i % 251) as u8).collect();

    let ptr = allocation.map_memory()?;
    unsafe { std::ptr::copy_nonoverlapping(pattern.as_ptr(), ptr, UPLOAD_SIZE) };
    allocation.flush(0, vk::WHOLE_SIZE)?;

    allocation.invalidate(0, vk::WHOLE_SIZE)?;
    let mut readback = vec![0u8; UPLOAD_SIZE];
    unsafe { std::ptr::copy_nonoverlapping(ptr, readback.as_mut_ptr(), UPLOAD_SIZE) };
    allocation.unmap_memory();

    assert_eq!(pattern, readback);
    log::info!("uploaded and read back {} bytes", UPLOAD_SIZE);

    // Teardown order: resources, then their memory, then the allocator, then
    // the device that everything borrowed.
    drop(buffer);
    drop(allocation);
    drop(allocator);
    unsafe {
        device.destroy_device(None);
        instance.destroy_instance(None);
    }

    Ok(())
}

mod listeners;
mod property_partition;

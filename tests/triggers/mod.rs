mod size;
